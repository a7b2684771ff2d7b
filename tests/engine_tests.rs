//! Engine Integration Tests
//!
//! Tests for:
//! - Frame bookkeeping (time, frame count, FrameState)
//! - Autorelease drained once per frame
//! - Frame clocks advanced by the engine
//! - RenderBackend hand-off
//! - Settings loaded from JSON

use std::cell::RefCell;
use std::rc::Rc;

use chaos::{Engine, FrameState, NodeFrame, Region, RenderBackend, Scene, SceneSettings, Sprite};

#[derive(Default)]
struct Recorder {
    frames: Rc<RefCell<Vec<(FrameState, usize)>>>,
}

impl RenderBackend for Recorder {
    fn draw(&mut self, scene: &Scene, frame: &FrameState) -> bool {
        self.frames.borrow_mut().push((*frame, scene.len()));
        true
    }
}

// ============================================================================
// Frame Loop
// ============================================================================

#[test]
fn update_advances_time_and_frame_count() {
    let mut engine = Engine::default();
    engine.scene.add_to_parent(engine.scene.root(), "node").unwrap();

    let stats = engine.update(0.5);
    engine.update(0.25);

    assert_eq!(stats.visited, 2);
    assert_eq!(engine.frame_count(), 2);
    assert!((engine.time() - 0.75).abs() < f32::EPSILON);
    assert_eq!(
        engine.frame_state(),
        FrameState {
            time: 0.75,
            dt: 0.25,
            frame_count: 2
        }
    );
}

#[test]
fn autoreleased_nodes_die_at_end_of_frame() {
    let mut engine = Engine::default();
    let temp = engine.scene.create_node("temp");
    engine.scene.autorelease(temp).unwrap();

    assert!(engine.scene.contains(temp));
    engine.update(0.016);
    assert!(!engine.scene.contains(temp));
}

#[test]
fn frame_clocks_advance_with_update() {
    let mut engine = Engine::default();
    let frames = vec![Region::new(0.0, 0.0, 8.0, 8.0), Region::new(8.0, 0.0, 8.0, 8.0)];
    let node = engine.scene.add_to_parent(engine.scene.root(), "blink").unwrap();
    engine
        .scene
        .node(node)
        .with_transform()
        .set_sprite(Sprite::new("blink", frames.clone()))
        .set_frame(NodeFrame::new(2, 4.0));

    engine.update(0.1);
    assert_eq!(engine.scene.get_node(node).unwrap().sprite().unwrap().region(), frames[0]);

    engine.update(0.2);
    assert_eq!(engine.scene.get_node(node).unwrap().sprite().unwrap().region(), frames[1]);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn render_without_backend_is_skipped() {
    let mut engine = Engine::default();
    engine.update(0.016);
    assert!(!engine.render());
}

#[test]
fn render_hands_updated_scene_to_backend() {
    let mut engine = Engine::default();
    let recorder = Recorder::default();
    let frames = Rc::clone(&recorder.frames);
    engine.set_backend(recorder);
    engine.scene.add_to_parent(engine.scene.root(), "node").unwrap();

    engine.update(0.5);
    assert!(engine.render());

    let drawn = frames.borrow();
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].0.frame_count, 1);
    assert_eq!(drawn[0].1, 2);
    drop(drawn);

    assert!(engine.take_backend().is_some());
    assert!(!engine.render());
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_from_json() -> anyhow::Result<()> {
    let settings = SceneSettings::from_json(r#"{ "root_tag": "stage", "log_lifecycle": false }"#)?;
    let engine = Engine::new(settings);

    let root = engine.scene.root();
    assert_eq!(engine.scene.get_node(root).unwrap().tag(), "stage");
    assert_eq!(engine.scene.settings().script_slice, 1);
    assert_eq!(engine.scene.child_by_tag(root, "stage"), Some(root));
    Ok(())
}
