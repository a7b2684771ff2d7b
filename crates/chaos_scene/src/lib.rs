//! Scene graph of the Chaos engine.
//!
//! - [`Scene`]: node arena, ownership, deferred actions
//! - [`hierarchy`]: attach, detach and reorder operations on [`Scene`]
//! - [`update`]: the per-frame update pass
//! - [`script`]: the explicit script scheduling context
//! - [`binding`]: validated access for the scripting layer
//!
//! # Example
//!
//! ```rust,ignore
//! use chaos_scene::{Scene, ScriptContext};
//!
//! let mut scene = Scene::new();
//! let mut scripts = ScriptContext::new();
//!
//! let hero = scene.add_to_parent(scene.root(), "hero")?;
//! scene.node(hero).with_transform().set_position(16.0, 0.0);
//! scene.update(&mut scripts);
//! ```

pub mod binding;
pub mod components;
pub mod hierarchy;
pub mod node;
pub mod scene;
pub mod script;
pub mod settings;
pub mod trigger;
pub mod update;
pub mod wrapper;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle of a node inside its [`Scene`].
    pub struct NodeHandle;
}

pub use binding::{ComponentBinding, NodeBinding, ObjectKind, ScriptValue, resolve_node, resolve_object};
pub use components::{NodeColor, NodeFrame, NodeUI, Region, Sprite, Transform};
pub use node::{DirtyFlags, Node};
pub use scene::Scene;
pub use script::{ScriptCall, ScriptContext, ScriptKey, ScriptSlot, ScriptState, ScriptStatus, ScriptThread};
pub use settings::SceneSettings;
pub use trigger::{Condition, TriggerAction, TriggerKey, TriggerRegistry};
pub use update::UpdateStats;
pub use wrapper::SceneNode;
