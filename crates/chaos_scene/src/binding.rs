//! Script binding surface.
//!
//! Scripts hold opaque [`ScriptValue`]s. Every value that should name a scene
//! object is validated here before it is dereferenced: it must be an
//! [`ScriptValue::Object`] of the expected [`ObjectKind`] whose node is still
//! live. Calls taking a whole collection (`addChildren`, `removeChildren`)
//! validate element by element; rejected elements are logged and skipped
//! while the rest of the call proceeds.
//!
//! ```rust,ignore
//! let hero = ScriptValue::node(hero);
//! let sword = NodeBinding::call(&mut scene, &scripts, &hero, "childByTag", &["sword".into()])?;
//! NodeBinding::call(&mut scene, &scripts, &sword, "moveTop", &[])?;
//! ```

use chaos_core::errors::{ChaosError, Result};

use crate::node::DirtyFlags;
use crate::scene::Scene;
use crate::script::{ScriptContext, ScriptKey};
use crate::trigger::Condition;
use crate::NodeHandle;

/// Capability of a script object handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Node,
    Transform,
    Color,
    Sprite,
    Frame,
    Ui,
}

impl ObjectKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Transform => "Transform",
            Self::Color => "Color",
            Self::Sprite => "Sprite",
            Self::Frame => "Frame",
            Self::Ui => "UI",
        }
    }
}

/// A value crossing the script boundary.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ScriptValue {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Handle to a node or one of its components.
    Object { kind: ObjectKind, node: NodeHandle },
    Thread(ScriptKey),
    Condition(Condition),
    List(Vec<ScriptValue>),
}

impl ScriptValue {
    #[must_use]
    pub fn node(node: NodeHandle) -> Self {
        Self::Object {
            kind: ObjectKind::Node,
            node,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Object { kind, .. } => kind.name(),
            Self::Thread(_) => "thread",
            Self::Condition(_) => "condition",
            Self::List(_) => "list",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The node behind an object of any kind, unvalidated.
    #[must_use]
    pub fn as_object(&self) -> Option<(ObjectKind, NodeHandle)> {
        match self {
            Self::Object { kind, node } => Some((*kind, *node)),
            _ => None,
        }
    }
}

impl From<Option<NodeHandle>> for ScriptValue {
    fn from(node: Option<NodeHandle>) -> Self {
        node.map_or(Self::Nil, Self::node)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Validates that `value` is a live node object.
pub fn resolve_node(scene: &Scene, value: &ScriptValue) -> Result<NodeHandle> {
    resolve_object(scene, value, ObjectKind::Node)
}

/// Validates that `value` is a live object of `kind`.
///
/// Component objects additionally require the node to still carry that
/// component.
pub fn resolve_object(scene: &Scene, value: &ScriptValue, kind: ObjectKind) -> Result<NodeHandle> {
    let ScriptValue::Object { kind: found, node } = value else {
        return Err(ChaosError::NotAnInstance(value.type_name()));
    };
    if *found != kind {
        return Err(ChaosError::WrongKind {
            expected: kind.name(),
            found: found.name(),
        });
    }
    let n = scene.try_node(*node)?;
    let present = match kind {
        ObjectKind::Node => true,
        ObjectKind::Transform => n.transform.is_some(),
        ObjectKind::Color => n.color.is_some(),
        ObjectKind::Sprite => n.sprite.is_some(),
        ObjectKind::Frame => n.frame.is_some(),
        ObjectKind::Ui => n.ui.is_some(),
    };
    if present {
        Ok(*node)
    } else {
        Err(ChaosError::NotAnInstance(kind.name()))
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

fn invalid(method: &'static str, index: usize, reason: impl ToString) -> ChaosError {
    ChaosError::InvalidArgument {
        method,
        index,
        reason: reason.to_string(),
    }
}

fn arg<'v>(args: &'v [ScriptValue], method: &'static str, index: usize) -> Result<&'v ScriptValue> {
    args.get(index).ok_or_else(|| invalid(method, index, "missing"))
}

fn node_arg(scene: &Scene, args: &[ScriptValue], method: &'static str, index: usize) -> Result<NodeHandle> {
    resolve_node(scene, arg(args, method, index)?).map_err(|err| invalid(method, index, err))
}

/// A missing or nil argument is `None`.
fn optional_node_arg(
    scene: &Scene,
    args: &[ScriptValue],
    method: &'static str,
    index: usize,
) -> Result<Option<NodeHandle>> {
    match args.get(index) {
        None | Some(ScriptValue::Nil) => Ok(None),
        Some(value) => resolve_node(scene, value)
            .map(Some)
            .map_err(|err| invalid(method, index, err)),
    }
}

fn str_arg<'v>(args: &'v [ScriptValue], method: &'static str, index: usize) -> Result<&'v str> {
    let value = arg(args, method, index)?;
    value
        .as_str()
        .ok_or_else(|| invalid(method, index, format!("expected a string, found {}", value.type_name())))
}

fn number_arg(args: &[ScriptValue], method: &'static str, index: usize) -> Result<f64> {
    let value = arg(args, method, index)?;
    value
        .as_number()
        .ok_or_else(|| invalid(method, index, format!("expected a number, found {}", value.type_name())))
}

fn index_arg(args: &[ScriptValue], method: &'static str, index: usize) -> Result<i32> {
    let n = number_arg(args, method, index)?;
    if !n.is_finite() || n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
        return Err(invalid(method, index, format!("{n} is not an integer index")));
    }
    Ok(n as i32)
}

fn list_arg<'v>(args: &'v [ScriptValue], method: &'static str, index: usize) -> Result<&'v [ScriptValue]> {
    match arg(args, method, index)? {
        ScriptValue::List(items) => Ok(items),
        other => Err(invalid(method, index, format!("expected a list, found {}", other.type_name()))),
    }
}

/// Gates are conditions; threads resolve to their completion condition.
fn condition_arg(
    scripts: &ScriptContext,
    args: &[ScriptValue],
    method: &'static str,
    index: usize,
) -> Result<Condition> {
    match arg(args, method, index)? {
        ScriptValue::Condition(condition) => Ok(*condition),
        ScriptValue::Thread(key) => scripts
            .condition_of(*key)
            .ok_or_else(|| invalid(method, index, ChaosError::StaleScript)),
        other => Err(invalid(
            method,
            index,
            format!("expected a condition or thread, found {}", other.type_name()),
        )),
    }
}

fn to_number(n: impl Into<f64>) -> ScriptValue {
    ScriptValue::Number(n.into())
}

// ============================================================================
// Node methods and properties
// ============================================================================

/// Script-visible methods and properties of node objects.
pub struct NodeBinding;

impl NodeBinding {
    pub const METHODS: &'static [&'static str] = &[
        "childByTag",
        "childByIndex",
        "relocateTo",
        "moveUp",
        "moveDown",
        "moveTop",
        "moveBottom",
        "addChild",
        "addChildren",
        "removeSelf",
        "removeChildren",
        "removeWhen",
        "removeAll",
        "removeAllChildren",
    ];

    pub const PROPERTIES: &'static [&'static str] = &[
        "transform",
        "color",
        "sprite",
        "frame",
        "script",
        "ui",
        "tag",
        "parent",
        "children",
    ];

    /// Calls `method` on the node `target`.
    ///
    /// `addChildren` and `removeChildren` return how many elements they
    /// attached or detached. `removeChildren` only detaches elements whose
    /// parent is `target`: a live node attached anywhere else is logged and
    /// left where it is, rather than being detached from its own parent.
    pub fn call(
        scene: &mut Scene,
        scripts: &ScriptContext,
        target: &ScriptValue,
        method: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue> {
        let this = resolve_node(scene, target)?;

        match method {
            "childByTag" => {
                let tag = str_arg(args, "childByTag", 0)?;
                Ok(scene.child_by_tag(this, tag).into())
            }
            "childByIndex" => {
                let index = index_arg(args, "childByIndex", 0)?;
                Ok(scene.child_by_index(this, index).into())
            }
            "relocateTo" => {
                let parent = node_arg(scene, args, "relocateTo", 0)?;
                let after = optional_node_arg(scene, args, "relocateTo", 1)?;
                scene.relocate_to(this, parent, after)?;
                Ok(ScriptValue::Nil)
            }
            "moveUp" => scene.move_upward(this).map(|()| ScriptValue::Nil),
            "moveDown" => scene.move_downward(this).map(|()| ScriptValue::Nil),
            "moveTop" => scene.move_top(this).map(|()| ScriptValue::Nil),
            "moveBottom" => scene.move_bottom(this).map(|()| ScriptValue::Nil),
            "addChild" => {
                let child = node_arg(scene, args, "addChild", 0)?;
                let after = optional_node_arg(scene, args, "addChild", 1)?;
                scene.add_child(this, child, after)?;
                Ok(ScriptValue::Nil)
            }
            "addChildren" => {
                let items = list_arg(args, "addChildren", 0)?;
                let after = optional_node_arg(scene, args, "addChildren", 1)?;
                let children = Self::valid_elements(scene, "addChildren", items);
                let added = scene.add_children(this, &children, after)?;
                Ok(to_number(added as f64))
            }
            "removeSelf" => scene.remove_self(this).map(|()| ScriptValue::Nil),
            "removeChildren" => {
                let items = list_arg(args, "removeChildren", 0)?;
                let mut children = Self::valid_elements(scene, "removeChildren", items);
                children.retain(|&child| {
                    let owned = scene.parent(child) == Some(this);
                    if !owned {
                        log::warn!("removeChildren: skipping '{}', not a child", scene.tag_of(child));
                    }
                    owned
                });
                Ok(to_number(scene.remove_children(&children) as f64))
            }
            "removeWhen" => {
                let condition = condition_arg(scripts, args, "removeWhen", 0)?;
                scene.remove_when_done(this, condition)?;
                Ok(ScriptValue::Nil)
            }
            "removeAll" | "removeAllChildren" => scene.remove_all_children(this).map(|()| ScriptValue::Nil),
            _ => Err(ChaosError::UnknownMethod(method.to_owned())),
        }
    }

    /// Resolves every element that is a live node, logging the rest.
    fn valid_elements(scene: &Scene, method: &'static str, items: &[ScriptValue]) -> Vec<NodeHandle> {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match resolve_node(scene, item) {
                Ok(node) => Some(node),
                Err(err) => {
                    log::warn!("{method}: skipping element {i}: {err}");
                    None
                }
            })
            .collect()
    }

    /// Reads a node property. Absent components read as nil.
    pub fn get(scene: &Scene, target: &ScriptValue, property: &str) -> Result<ScriptValue> {
        let this = resolve_node(scene, target)?;
        let node = scene.try_node(this)?;
        let component = |present: bool, kind: ObjectKind| {
            if present {
                ScriptValue::Object { kind, node: this }
            } else {
                ScriptValue::Nil
            }
        };

        Ok(match property {
            "transform" => component(node.transform.is_some(), ObjectKind::Transform),
            "color" => component(node.color.is_some(), ObjectKind::Color),
            "sprite" => component(node.sprite.is_some(), ObjectKind::Sprite),
            "frame" => component(node.frame.is_some(), ObjectKind::Frame),
            "ui" => component(node.ui.is_some(), ObjectKind::Ui),
            "script" => node.script.map_or(ScriptValue::Nil, |s| ScriptValue::Thread(s.key)),
            "tag" => ScriptValue::Str(node.tag().to_owned()),
            "parent" => node.parent.into(),
            "children" => ScriptValue::List(scene.children_iter(this).map(ScriptValue::node).collect()),
            _ => return Err(ChaosError::UnknownProperty(property.to_owned())),
        })
    }

    /// Writes a node property. Only `script` is writable; nil detaches.
    pub fn set(
        scene: &mut Scene,
        scripts: &ScriptContext,
        target: &ScriptValue,
        property: &str,
        value: &ScriptValue,
    ) -> Result<()> {
        let this = resolve_node(scene, target)?;
        if property != "script" {
            return Err(ChaosError::UnknownProperty(property.to_owned()));
        }

        let key = match value {
            ScriptValue::Nil => None,
            ScriptValue::Thread(key) if scripts.contains(*key) => Some(*key),
            ScriptValue::Thread(_) => return Err(invalid("script", 0, ChaosError::StaleScript)),
            other => {
                return Err(invalid(
                    "script",
                    0,
                    format!("expected a thread, found {}", other.type_name()),
                ));
            }
        };
        scene.try_node_mut(this)?.set_script(key);
        Ok(())
    }
}

// ============================================================================
// Component fields
// ============================================================================

/// Script-visible fields of component objects.
pub struct ComponentBinding;

impl ComponentBinding {
    /// Reads `field` of a component object.
    pub fn get(scene: &Scene, target: &ScriptValue, field: &str) -> Result<ScriptValue> {
        let (kind, _) = target
            .as_object()
            .ok_or(ChaosError::NotAnInstance(target.type_name()))?;
        let handle = resolve_object(scene, target, kind)?;
        let node = scene.try_node(handle)?;
        let unknown = || ChaosError::UnknownProperty(format!("{}.{field}", kind.name()));

        let value = match kind {
            ObjectKind::Node => return NodeBinding::get(scene, target, field),
            ObjectKind::Transform => {
                let t = node.transform.as_ref().ok_or_else(unknown)?;
                match field {
                    "x" => to_number(t.position.x),
                    "y" => to_number(t.position.y),
                    "rotation" => to_number(t.rotation),
                    "scaleX" => to_number(t.scale.x),
                    "scaleY" => to_number(t.scale.y),
                    "worldX" => to_number(t.world_position().x),
                    "worldY" => to_number(t.world_position().y),
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Color => {
                let c = node.color.as_ref().ok_or_else(unknown)?;
                match field {
                    "r" => to_number(c.color.x),
                    "g" => to_number(c.color.y),
                    "b" => to_number(c.color.z),
                    "a" => to_number(c.color.w),
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Sprite => {
                let s = node.sprite.as_ref().ok_or_else(unknown)?;
                match field {
                    "frame" => to_number(s.frame() as f64),
                    "frameCount" => to_number(s.frame_count() as f64),
                    "texture" => s.texture.as_deref().map_or(ScriptValue::Nil, ScriptValue::from),
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Frame => {
                let f = node.frame.as_ref().ok_or_else(unknown)?;
                match field {
                    "frame" => to_number(f.current() as f64),
                    "fps" => to_number(f.fps),
                    "looping" => ScriptValue::Bool(f.looping),
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Ui => {
                let ui = node.ui.as_ref().ok_or_else(unknown)?;
                match field {
                    "interactive" => ScriptValue::Bool(ui.interactive),
                    _ => return Err(unknown()),
                }
            }
        };
        Ok(value)
    }

    /// Writes `field` of a component object and marks the node dirty.
    pub fn set(scene: &mut Scene, target: &ScriptValue, field: &str, value: &ScriptValue) -> Result<()> {
        let (kind, _) = target
            .as_object()
            .ok_or(ChaosError::NotAnInstance(target.type_name()))?;
        let handle = resolve_object(scene, target, kind)?;
        let unknown = || ChaosError::UnknownProperty(format!("{}.{field}", kind.name()));
        let number = || {
            value
                .as_number()
                .map(|n| n as f32)
                .ok_or_else(|| invalid("set", 0, format!("expected a number, found {}", value.type_name())))
        };
        let node = scene.try_node_mut(handle)?;

        match kind {
            ObjectKind::Node => return Err(unknown()),
            ObjectKind::Transform => {
                let t = node.transform_mut().ok_or_else(unknown)?;
                match field {
                    "x" => t.position.x = number()?,
                    "y" => t.position.y = number()?,
                    "rotation" => t.rotation = number()?,
                    "scaleX" => t.scale.x = number()?,
                    "scaleY" => t.scale.y = number()?,
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Color => {
                let c = node.color_mut().ok_or_else(unknown)?;
                match field {
                    "r" => c.color.x = number()?,
                    "g" => c.color.y = number()?,
                    "b" => c.color.z = number()?,
                    "a" => c.set_alpha(number()?),
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Sprite => match field {
                "frame" => {
                    let frame = number()? as usize;
                    if let Some(sprite) = node.sprite_mut() {
                        sprite.update_region(frame);
                    }
                    node.mark_dirty(DirtyFlags::TRANSFORM);
                }
                _ => return Err(unknown()),
            },
            ObjectKind::Frame => {
                let f = node.frame_mut().ok_or_else(unknown)?;
                match field {
                    "fps" => f.fps = number()?,
                    "looping" => match value {
                        ScriptValue::Bool(b) => f.looping = *b,
                        other => {
                            return Err(invalid(
                                "set",
                                0,
                                format!("expected a boolean, found {}", other.type_name()),
                            ));
                        }
                    },
                    _ => return Err(unknown()),
                }
            }
            ObjectKind::Ui => {
                let ui = node.ui_mut().ok_or_else(unknown)?;
                match field {
                    "interactive" => match value {
                        ScriptValue::Bool(b) => ui.interactive = *b,
                        other => {
                            return Err(invalid(
                                "set",
                                0,
                                format!("expected a boolean, found {}", other.type_name()),
                            ));
                        }
                    },
                    _ => return Err(unknown()),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_by_kind() {
        let mut scene = Scene::new();
        let node = scene.add_to_parent(scene.root(), "n").unwrap();

        assert_eq!(resolve_node(&scene, &ScriptValue::node(node)).unwrap(), node);
        assert!(matches!(
            resolve_node(&scene, &ScriptValue::Number(1.0)),
            Err(ChaosError::NotAnInstance("number"))
        ));
        let transform = ScriptValue::Object {
            kind: ObjectKind::Transform,
            node,
        };
        assert!(matches!(
            resolve_node(&scene, &transform),
            Err(ChaosError::WrongKind { expected: "Node", found: "Transform" })
        ));
        // The node carries no transform yet.
        assert!(resolve_object(&scene, &transform, ObjectKind::Transform).is_err());
    }

    #[test]
    fn test_index_arg_rejects_fractions() {
        let args = [ScriptValue::Number(1.5)];
        assert!(matches!(
            index_arg(&args, "childByIndex", 0),
            Err(ChaosError::InvalidArgument { index: 0, .. })
        ));
        assert_eq!(index_arg(&[ScriptValue::Number(-2.0)], "childByIndex", 0).unwrap(), -2);
    }
}
