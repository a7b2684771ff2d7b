use glam::{Affine2, Vec2};

/// 2D transform component.
///
/// Holds the node's position, rotation and scale in its parent's space, the
/// cached local and world matrices, and shadow state used to skip rebuilding
/// the local matrix when nothing changed.
#[derive(Debug, Clone)]
pub struct Transform {
    // === Public properties ===
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,

    // === Matrix cache ===
    pub(crate) local_matrix: Affine2,
    pub(crate) world_matrix: Affine2,

    // === Shadow state ===
    last_position: Vec2,
    last_rotation: f32,
    last_scale: Vec2,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,

            local_matrix: Affine2::IDENTITY,
            world_matrix: Affine2::IDENTITY,

            last_position: Vec2::ZERO,
            last_rotation: 0.0,
            last_scale: Vec2::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    /// Rebuilds the local matrix if a TRS property changed.
    ///
    /// Returns whether the local matrix changed.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix =
                Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position);

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// Recomputes the world matrix against `parent_world`.
    ///
    /// The world matrix is always rebuilt because the parent may have moved
    /// even when this node's own TRS did not change.
    pub fn update_transform(&mut self, parent_world: &Affine2) {
        self.update_local_matrix();
        self.world_matrix = *parent_world * self.local_matrix;
    }

    /// Rebuilds both matrices unconditionally.
    pub fn force_update(&mut self, parent_world: &Affine2) {
        self.force_update = true;
        self.update_transform(parent_world);
    }

    /// Re-expresses the transform in the space of a new parent.
    ///
    /// The world placement is preserved: the new local TRS is derived from
    /// the current world matrix and `new_parent_world`. Call
    /// [`force_update`](Self::force_update) first so the world matrix is current.
    pub fn relocate(&mut self, new_parent_world: &Affine2) {
        let local = new_parent_world.inverse() * self.world_matrix;
        let (scale, angle, translation) = local.to_scale_angle_translation();

        self.scale = scale;
        self.rotation = angle;
        self.position = translation;
        self.local_matrix = local;

        self.last_scale = scale;
        self.last_rotation = angle;
        self.last_position = translation;
        self.mark_dirty();
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine2 {
        &self.local_matrix
    }

    /// World matrix, valid after the node's last update step.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine2 {
        &self.world_matrix
    }

    /// World-space position, valid after the node's last update step.
    #[inline]
    #[must_use]
    pub fn world_position(&self) -> Vec2 {
        self.world_matrix.translation
    }

    /// Forces the next update to rebuild the local matrix.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-4;

    fn vec2_approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_local_matrix_dirty_check() {
        let mut t = Transform::new();
        assert!(t.update_local_matrix());
        assert!(!t.update_local_matrix());

        t.position = Vec2::new(3.0, 4.0);
        assert!(t.update_local_matrix());
        assert!(!t.update_local_matrix());

        t.rotation = FRAC_PI_2;
        assert!(t.update_local_matrix());
    }

    #[test]
    fn test_world_matrix_composes_parent() {
        let parent = Affine2::from_translation(Vec2::new(10.0, 0.0));
        let mut t = Transform::from_position(Vec2::new(0.0, 5.0));
        t.update_transform(&parent);
        assert!(vec2_approx(t.world_position(), Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn test_relocate_preserves_world_placement() {
        let old_parent = Affine2::from_translation(Vec2::new(10.0, 0.0));
        let new_parent = Affine2::from_scale_angle_translation(
            Vec2::splat(2.0),
            FRAC_PI_2,
            Vec2::new(-4.0, 1.0),
        );

        let mut t = Transform::from_position(Vec2::new(1.0, 2.0));
        t.force_update(&old_parent);
        let world_before = t.world_position();

        t.relocate(&new_parent);
        t.update_transform(&new_parent);

        assert!(vec2_approx(t.world_position(), world_before));
    }
}
