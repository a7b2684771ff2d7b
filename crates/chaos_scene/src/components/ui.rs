use glam::Vec2;

use super::sprite::Region;

/// UI component: hit-testable bounds in the node's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUI {
    pub bounds: Region,
    pub interactive: bool,
}

impl NodeUI {
    #[must_use]
    pub fn new(bounds: Region) -> Self {
        Self {
            bounds,
            interactive: true,
        }
    }

    /// Whether a local-space point hits this element.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.interactive && self.bounds.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_respects_interactive_flag() {
        let mut ui = NodeUI::new(Region::new(0.0, 0.0, 10.0, 4.0));
        assert!(ui.contains(Vec2::new(5.0, 2.0)));
        assert!(!ui.contains(Vec2::new(10.0, 2.0)));

        ui.interactive = false;
        assert!(!ui.contains(Vec2::new(5.0, 2.0)));
    }
}
