//! # Chaos
//!
//! A 2D scene-graph engine core: a reference-counted node tree, a per-frame
//! update pass with cooperative scripts, deferred actions, and a validated
//! binding surface for a scripting layer.
//!
//! This umbrella crate re-exports the member crates and adds the
//! [`Engine`] frame driver.
//!
//! ```rust,ignore
//! use chaos::prelude::*;
//!
//! let mut engine = Engine::default();
//! let root = engine.scene.root();
//! let hero = engine.scene.add_to_parent(root, "hero")?;
//! engine.scene.node(hero).with_transform().set_position(8.0, 8.0);
//! engine.update(1.0 / 60.0);
//! ```

pub mod engine;

pub use chaos_core as core;
pub use chaos_scene as scene;

pub use chaos_core::{AutoreleasePool, ChaosError, RefCount, Result, Symbol, interner};
pub use chaos_scene::{
    ComponentBinding, Condition, DirtyFlags, Node, NodeBinding, NodeColor, NodeFrame, NodeHandle, NodeUI,
    ObjectKind, Region, Scene, SceneNode, SceneSettings, ScriptCall, ScriptContext, ScriptKey, ScriptState,
    ScriptStatus, ScriptThread, ScriptValue, Sprite, Transform, TriggerAction, TriggerKey, UpdateStats,
};
pub use engine::{Engine, FrameState, RenderBackend};

/// Everything a game loop usually needs.
pub mod prelude {
    pub use crate::engine::{Engine, FrameState, RenderBackend};
    pub use chaos_core::{ChaosError, Result};
    pub use chaos_scene::{
        Condition, DirtyFlags, NodeColor, NodeFrame, NodeHandle, NodeUI, Region, Scene, SceneSettings,
        ScriptCall, ScriptContext, ScriptStatus, ScriptValue, Sprite, Transform, TriggerAction,
    };
    pub use glam::{Vec2, Vec4};
}
