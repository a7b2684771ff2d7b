//! Script Binding Integration Tests
//!
//! Tests for:
//! - Node methods dispatched by name
//! - Per-element validation in addChildren/removeChildren
//! - Property reads and the writable `script` property
//! - Component field access through capability-tagged objects
//! - Binding calls made by a script during its own slice

use std::cell::Cell;
use std::rc::Rc;

use chaos::{
    ChaosError, ComponentBinding, NodeBinding, NodeHandle, ObjectKind, Result, Scene, ScriptCall, ScriptContext,
    ScriptStatus, ScriptValue, Transform,
};
use glam::Vec2;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup() -> (Scene, ScriptContext) {
    init_logs();
    (Scene::new(), ScriptContext::new())
}

fn call(scene: &mut Scene, scripts: &ScriptContext, target: NodeHandle, method: &str, args: &[ScriptValue]) -> Result<ScriptValue> {
    NodeBinding::call(scene, scripts, &ScriptValue::node(target), method, args)
}

fn tags(scene: &Scene, parent: NodeHandle) -> Vec<&'static str> {
    scene
        .children_iter(parent)
        .map(|h| scene.get_node(h).unwrap().tag())
        .collect()
}

// ============================================================================
// Methods
// ============================================================================

#[test]
fn lookups_return_node_values() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let a = scene.add_to_parent(root, "a").unwrap();
    let b = scene.add_to_parent(root, "b").unwrap();

    let found = call(&mut scene, &scripts, root, "childByTag", &["a".into()]).unwrap();
    assert_eq!(found, ScriptValue::node(a));

    let first = call(&mut scene, &scripts, root, "childByIndex", &[(-1.0).into()]).unwrap();
    assert_eq!(first, ScriptValue::node(b));

    let missing = call(&mut scene, &scripts, root, "childByIndex", &[5.0.into()]).unwrap();
    assert!(missing.is_nil());
}

#[test]
fn reorder_methods() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let c = scene.add_to_parent(root, "c").unwrap();
    scene.add_to_parent(root, "b").unwrap();
    let a = scene.add_to_parent(root, "a").unwrap();

    call(&mut scene, &scripts, a, "moveTop", &[]).unwrap();
    assert_eq!(tags(&scene, root), ["b", "c", "a"]);
    call(&mut scene, &scripts, c, "moveBottom", &[]).unwrap();
    assert_eq!(tags(&scene, root), ["c", "b", "a"]);
    call(&mut scene, &scripts, c, "moveUp", &[]).unwrap();
    assert_eq!(tags(&scene, root), ["b", "c", "a"]);
    call(&mut scene, &scripts, a, "moveDown", &[]).unwrap();
    assert_eq!(tags(&scene, root), ["b", "a", "c"]);
}

#[test]
fn add_child_with_after() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let first = scene.add_to_parent(root, "first").unwrap();
    let node = scene.create_node("second");

    let args = [ScriptValue::node(node), ScriptValue::node(first)];
    call(&mut scene, &scripts, root, "addChild", &args).unwrap();

    assert_eq!(tags(&scene, root), ["first", "second"]);
}

#[test]
fn add_children_skips_invalid_elements() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let a = scene.create_node("a");
    let b = scene.create_node("b");
    let stale = scene.create_node("stale");
    scene.release(stale).unwrap();

    let list = ScriptValue::List(vec![
        ScriptValue::node(a),
        ScriptValue::Number(7.0),
        ScriptValue::node(stale),
        ScriptValue::Object {
            kind: ObjectKind::Transform,
            node: b,
        },
        ScriptValue::node(b),
    ]);
    let added = call(&mut scene, &scripts, root, "addChildren", &[list]).unwrap();

    assert_eq!(added, ScriptValue::Number(2.0));
    assert_eq!(tags(&scene, root), ["a", "b"]);
}

#[test]
fn remove_children_skips_invalid_and_foreign() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let a = scene.add_to_parent(root, "a").unwrap();
    let keep = scene.add_to_parent(root, "keep").unwrap();
    let nested = scene.add_to_parent(keep, "nested").unwrap();

    let list = ScriptValue::List(vec![ScriptValue::node(a), "junk".into(), ScriptValue::node(nested)]);
    let removed = call(&mut scene, &scripts, root, "removeChildren", &[list]).unwrap();

    assert_eq!(removed, ScriptValue::Number(1.0));
    assert!(!scene.contains(a));
    assert_eq!(scene.parent(nested), Some(keep));
}

#[test]
fn remove_self_and_remove_all() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let parent = scene.add_to_parent(root, "parent").unwrap();
    scene.add_to_parent(parent, "x").unwrap();
    scene.add_to_parent(parent, "y").unwrap();

    call(&mut scene, &scripts, parent, "removeAll", &[]).unwrap();
    assert_eq!(scene.child_count(parent), 0);

    scene.add_to_parent(parent, "z").unwrap();
    call(&mut scene, &scripts, parent, "removeAllChildren", &[]).unwrap();
    assert_eq!(scene.first_child(parent), None);

    call(&mut scene, &scripts, parent, "removeSelf", &[]).unwrap();
    assert!(!scene.contains(parent));
}

#[test]
fn remove_when_thread_finishes() {
    let (mut scene, mut scripts) = setup();
    let node = scene.add_to_parent(scene.root(), "effect").unwrap();
    let thread = scripts.spawn(|_call: &mut ScriptCall<'_>| -> Result<ScriptStatus> { Ok(ScriptStatus::Finished) });

    call(&mut scene, &scripts, node, "removeWhen", &[ScriptValue::Thread(thread)]).unwrap();
    assert!(scene.contains(node));

    scripts.wake(&mut scene, thread);
    assert!(!scene.contains(node));
}

#[test]
fn relocate_through_binding() {
    let (mut scene, scripts) = setup();
    let root = scene.root();
    let from = scene.add_to_parent(root, "from").unwrap();
    let to = scene.add_to_parent(root, "to").unwrap();
    let node = scene.add_to_parent(from, "node").unwrap();
    for h in [from, to, node] {
        scene.node(h).set_transform(Transform::new());
    }

    call(&mut scene, &scripts, node, "relocateTo", &[ScriptValue::node(to), ScriptValue::Nil]).unwrap();

    assert_eq!(scene.parent(node), Some(to));
}

#[test]
fn rejected_calls() {
    let (mut scene, scripts) = setup();
    let root = scene.root();

    assert!(matches!(
        call(&mut scene, &scripts, root, "explode", &[]),
        Err(ChaosError::UnknownMethod(_))
    ));
    assert!(matches!(
        NodeBinding::call(&mut scene, &scripts, &ScriptValue::Bool(true), "moveTop", &[]),
        Err(ChaosError::NotAnInstance("boolean"))
    ));
    assert!(matches!(
        call(&mut scene, &scripts, root, "childByIndex", &["one".into()]),
        Err(ChaosError::InvalidArgument { method: "childByIndex", index: 0, .. })
    ));
    assert!(matches!(
        call(&mut scene, &scripts, root, "addChild", &[]),
        Err(ChaosError::InvalidArgument { method: "addChild", .. })
    ));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn property_reads() {
    let (mut scene, _scripts) = setup();
    let root = scene.root();
    let node = scene.add_to_parent(root, "hero").unwrap();
    let child = scene.add_to_parent(node, "sword").unwrap();
    let target = ScriptValue::node(node);

    assert_eq!(NodeBinding::get(&scene, &target, "tag").unwrap(), ScriptValue::Str("hero".into()));
    assert_eq!(NodeBinding::get(&scene, &target, "parent").unwrap(), ScriptValue::node(root));
    assert_eq!(
        NodeBinding::get(&scene, &target, "children").unwrap(),
        ScriptValue::List(vec![ScriptValue::node(child)])
    );
    assert!(NodeBinding::get(&scene, &target, "transform").unwrap().is_nil());
    assert!(NodeBinding::get(&scene, &target, "script").unwrap().is_nil());

    scene.node(node).with_transform();
    assert_eq!(
        NodeBinding::get(&scene, &target, "transform").unwrap(),
        ScriptValue::Object {
            kind: ObjectKind::Transform,
            node
        }
    );
    assert!(matches!(
        NodeBinding::get(&scene, &target, "mass"),
        Err(ChaosError::UnknownProperty(_))
    ));
}

#[test]
fn script_property_attaches_thread() {
    let (mut scene, mut scripts) = setup();
    let node = scene.add_to_parent(scene.root(), "actor").unwrap();
    let runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&runs);
    let thread = scripts.spawn(move |_call: &mut ScriptCall<'_>| -> Result<ScriptStatus> {
        counter.set(counter.get() + 1);
        Ok(ScriptStatus::Finished)
    });
    let target = ScriptValue::node(node);

    NodeBinding::set(&mut scene, &scripts, &target, "script", &ScriptValue::Thread(thread)).unwrap();
    assert_eq!(NodeBinding::get(&scene, &target, "script").unwrap(), ScriptValue::Thread(thread));
    scene.update(&mut scripts);
    assert_eq!(runs.get(), 1);

    NodeBinding::set(&mut scene, &scripts, &target, "script", &ScriptValue::Nil).unwrap();
    scene.update(&mut scripts);
    assert_eq!(runs.get(), 1);

    assert!(NodeBinding::set(&mut scene, &scripts, &target, "script", &"main.lua".into()).is_err());
    assert!(matches!(
        NodeBinding::set(&mut scene, &scripts, &target, "tag", &"renamed".into()),
        Err(ChaosError::UnknownProperty(_))
    ));
}

// ============================================================================
// Component Fields
// ============================================================================

#[test]
fn transform_fields_round_trip_through_update() {
    let (mut scene, mut scripts) = setup();
    let node = scene.add_to_parent(scene.root(), "hero").unwrap();
    scene.node(node).with_transform();
    scene.update(&mut scripts);

    let transform = NodeBinding::get(&scene, &ScriptValue::node(node), "transform").unwrap();
    ComponentBinding::set(&mut scene, &transform, "x", &4.0.into()).unwrap();
    ComponentBinding::set(&mut scene, &transform, "y", &(-2.0).into()).unwrap();
    scene.update(&mut scripts);

    assert_eq!(ComponentBinding::get(&scene, &transform, "worldX").unwrap(), ScriptValue::Number(4.0));
    assert_eq!(ComponentBinding::get(&scene, &transform, "worldY").unwrap(), ScriptValue::Number(-2.0));
    let world = scene.get_node(node).unwrap().transform().unwrap().world_position();
    assert_eq!(world, Vec2::new(4.0, -2.0));
}

#[test]
fn component_object_without_component_is_rejected() {
    let (mut scene, _scripts) = setup();
    let node = scene.add_to_parent(scene.root(), "plain").unwrap();
    let color = ScriptValue::Object {
        kind: ObjectKind::Color,
        node,
    };

    assert!(matches!(
        ComponentBinding::get(&scene, &color, "a"),
        Err(ChaosError::NotAnInstance("Color"))
    ));
    assert!(ComponentBinding::set(&mut scene, &color, "a", &0.5.into()).is_err());
}

// ============================================================================
// Calls From Running Scripts
// ============================================================================

#[test]
fn script_calls_remove_when_during_its_slice() {
    let (mut scene, mut scripts) = setup();
    let gate = scripts.spawn(|_call: &mut ScriptCall<'_>| -> Result<ScriptStatus> { Ok(ScriptStatus::Yielded) });
    let node = scene.add_to_parent(scene.root(), "effect").unwrap();

    let armed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&armed);
    let actor = scripts.spawn(move |call: &mut ScriptCall<'_>| -> Result<ScriptStatus> {
        if !flag.get() {
            let this = ScriptValue::node(call.node);
            NodeBinding::call(call.scene, call.scripts, &this, "removeWhen", &[ScriptValue::Thread(gate)])?;
            flag.set(true);
        }
        Ok(ScriptStatus::Finished)
    });
    scene.get_node_mut(node).unwrap().set_script(Some(actor));

    let stats = scene.update(&mut scripts);
    assert_eq!(stats.script_errors, 0);
    assert!(armed.get());
    assert_eq!(scene.pending_triggers(scripts.condition_of(gate).unwrap()), 1);
    assert!(scene.contains(node));

    scripts.wake(&mut scene, gate);
    assert!(!scene.contains(node));
}

#[test]
fn script_reads_its_own_thread_through_binding() {
    let (mut scene, mut scripts) = setup();
    let node = scene.add_to_parent(scene.root(), "actor").unwrap();
    let seen = Rc::new(Cell::new(false));

    let out = Rc::clone(&seen);
    let key = scripts.spawn(move |call: &mut ScriptCall<'_>| -> Result<ScriptStatus> {
        let this = ScriptValue::node(call.node);
        let ScriptValue::Thread(own) = NodeBinding::get(call.scene, &this, "script")? else {
            return Err(ChaosError::Script("no script".into()));
        };
        out.set(call.scripts.contains(own) && call.scripts.condition_of(own).is_some());
        // Detaching itself through the binding is allowed mid-slice.
        NodeBinding::set(call.scene, call.scripts, &this, "script", &ScriptValue::Nil)?;
        Ok(ScriptStatus::Yielded)
    });
    scene.get_node_mut(node).unwrap().set_script(Some(key));

    let stats = scene.update(&mut scripts);
    assert!(seen.get());
    assert_eq!(stats.script_errors, 0);
    assert_eq!(stats.scripts_suspended, 0);
    assert!(scene.get_node(node).unwrap().script().is_none());
    assert_eq!(scene.ref_count(node), Some(1));
}
