use glam::Vec4;

/// Color component.
///
/// `color` is the node's own RGBA tint; the derived color multiplies it with
/// the parent's derived color so fading a parent fades its subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeColor {
    pub color: Vec4,
    derived: Vec4,
}

impl NodeColor {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            color,
            derived: color,
        }
    }

    #[must_use]
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(Vec4::new(r, g, b, a))
    }

    #[inline]
    pub fn set_alpha(&mut self, alpha: f32) {
        self.color.w = alpha;
    }

    /// Recomputes the derived color from the parent's derived color.
    pub fn update_color(&mut self, parent: Vec4) {
        self.derived = self.color * parent;
    }

    /// Color after inheritance, valid after the node's last update step.
    #[inline]
    #[must_use]
    pub fn derived(&self) -> Vec4 {
        self.derived
    }
}

impl Default for NodeColor {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}
