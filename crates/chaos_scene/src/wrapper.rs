//! Chainable node editing wrapper.
//!
//! [`SceneNode`] borrows a [`Scene`] mutably and provides a fluent API for
//! editing a node's components without `get_node_mut().unwrap()`. Every
//! edit marks the matching dirty flag.
//!
//! All methods silently no-op when the handle is stale or the node lacks the
//! component, so loaders never panic on dangling handles.
//!
//! # Example
//!
//! ```rust,ignore
//! scene.node(handle)
//!     .with_transform()
//!     .set_position(32.0, 16.0)
//!     .set_rotation(FRAC_PI_2)
//!     .set_alpha(0.5);
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Vec2, Vec4};

use crate::components::{NodeColor, NodeFrame, NodeUI, Sprite, Transform};
use crate::node::{DirtyFlags, Node};
use crate::scene::Scene;
use crate::NodeHandle;

/// Temporary mutable borrow of a scene node for chainable edits.
pub struct SceneNode<'a> {
    scene: &'a mut Scene,
    handle: NodeHandle,
}

impl<'a> SceneNode<'a> {
    #[inline]
    pub fn new(scene: &'a mut Scene, handle: NodeHandle) -> Self {
        Self { scene, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    #[inline]
    fn edit(self, f: impl FnOnce(&mut Node)) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            f(node);
        }
        self
    }

    // -- Component setup --

    /// Gives the node an identity transform if it has none.
    pub fn with_transform(self) -> Self {
        self.edit(|node| {
            if node.transform().is_none() {
                node.set_transform(Some(Transform::new()));
            }
        })
    }

    pub fn set_transform(self, transform: Transform) -> Self {
        self.edit(|node| node.set_transform(Some(transform)))
    }

    pub fn set_color(self, color: NodeColor) -> Self {
        self.edit(|node| node.set_color(Some(color)))
    }

    pub fn set_sprite(self, sprite: Sprite) -> Self {
        self.edit(|node| node.set_sprite(Some(sprite)))
    }

    pub fn set_frame(self, frame: NodeFrame) -> Self {
        self.edit(|node| node.set_frame(Some(frame)))
    }

    pub fn set_ui(self, ui: NodeUI) -> Self {
        self.edit(|node| node.set_ui(Some(ui)))
    }

    // -- Transform setters (chainable) --

    /// Sets the local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32) -> Self {
        self.edit(|node| {
            if let Some(t) = node.transform_mut() {
                t.position = Vec2::new(x, y);
            }
        })
    }

    /// Moves the local position by `delta`.
    #[inline]
    pub fn translate(self, delta: Vec2) -> Self {
        self.edit(|node| {
            if let Some(t) = node.transform_mut() {
                t.position += delta;
            }
        })
    }

    /// Sets rotation in radians.
    #[inline]
    pub fn set_rotation(self, angle: f32) -> Self {
        self.edit(|node| {
            if let Some(t) = node.transform_mut() {
                t.rotation = angle;
            }
        })
    }

    /// Rotates by `angle` radians (cumulative).
    #[inline]
    pub fn rotate(self, angle: f32) -> Self {
        self.edit(|node| {
            if let Some(t) = node.transform_mut() {
                t.rotation += angle;
            }
        })
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.edit(|node| {
            if let Some(t) = node.transform_mut() {
                t.scale = Vec2::splat(s);
            }
        })
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xy(self, x: f32, y: f32) -> Self {
        self.edit(|node| {
            if let Some(t) = node.transform_mut() {
                t.scale = Vec2::new(x, y);
            }
        })
    }

    // -- Color setters --

    /// Sets the local tint (no-op if the node has no color).
    #[inline]
    pub fn set_tint(self, rgba: Vec4) -> Self {
        self.edit(|node| {
            if let Some(c) = node.color_mut() {
                c.color = rgba;
            }
        })
    }

    #[inline]
    pub fn set_alpha(self, alpha: f32) -> Self {
        self.edit(|node| {
            if let Some(c) = node.color_mut() {
                c.set_alpha(alpha);
            }
        })
    }

    // -- Animation --

    /// Restarts the frame clock.
    pub fn rewind(self) -> Self {
        self.edit(|node| {
            if let Some(frame) = node.frame_mut() {
                frame.rewind();
                node.mark_dirty(DirtyFlags::TRANSFORM);
            }
        })
    }
}
