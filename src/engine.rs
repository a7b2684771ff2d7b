//! Engine Core Module
//!
//! This module contains [`Engine`], the per-frame driver of a scene. It owns
//! no window or GPU state; a frontend calls [`Engine::update`] once per frame
//! and then [`Engine::render`] to hand the updated scene to a
//! [`RenderBackend`].
//!
//! # Frame order
//!
//! 1. frame clocks advance by `dt`
//! 2. the update pass runs scripts and recomputes dirty components
//! 3. the autorelease pool is drained
//! 4. the backend draws (if one is attached)
//!
//! # Example
//!
//! ```rust,ignore
//! use chaos::{Engine, SceneSettings};
//!
//! let mut engine = Engine::new(SceneSettings::default());
//! let hero = engine.scene.add_to_parent(engine.scene.root(), "hero")?;
//!
//! loop {
//!     engine.update(dt);
//!     engine.render();
//! }
//! ```

use chaos_scene::{Scene, SceneSettings, ScriptContext, UpdateStats};

/// Draw step consuming the scene after its update pass.
///
/// Implementations read the recomputed transform, color and sprite state;
/// they must not mutate the tree.
pub trait RenderBackend {
    /// Draws one frame. Returns whether anything was drawn.
    fn draw(&mut self, scene: &Scene, frame: &FrameState) -> bool;
}

/// The engine instance driving one scene.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`] or [`Engine::default`]
/// 2. Populate [`scene`](Self::scene) and spawn threads into [`scripts`](Self::scripts)
/// 3. Call [`Engine::update`] each frame, then [`Engine::render`]
pub struct Engine {
    pub scene: Scene,
    pub scripts: ScriptContext,

    backend: Option<Box<dyn RenderBackend>>,
    time: f32,
    last_dt: f32,
    frame_count: u64,
}

impl Engine {
    #[must_use]
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            scene: Scene::with_settings(settings),
            scripts: ScriptContext::new(),
            backend: None,
            time: 0.0,
            last_dt: 0.0,
            frame_count: 0,
        }
    }

    /// Attaches the draw step, replacing any previous one.
    pub fn set_backend(&mut self, backend: impl RenderBackend + 'static) {
        self.backend = Some(Box::new(backend));
    }

    /// Detaches and returns the draw step.
    pub fn take_backend(&mut self) -> Option<Box<dyn RenderBackend>> {
        self.backend.take()
    }

    /// Returns the total elapsed time in seconds since the engine started.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the total number of frames updated since startup.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    #[must_use]
    pub fn frame_state(&self) -> FrameState {
        FrameState {
            time: self.time,
            dt: self.last_dt,
            frame_count: self.frame_count,
        }
    }

    /// Updates the scene for the current frame.
    ///
    /// # Arguments
    ///
    /// * `dt` - Delta time since the last frame in seconds
    pub fn update(&mut self, dt: f32) -> UpdateStats {
        self.time += dt;
        self.last_dt = dt;
        self.frame_count += 1;

        self.scene.advance_frames(dt);
        let stats = self.scene.update(&mut self.scripts);
        let released = self.scene.drain_autorelease();

        log::trace!(
            "Frame {}: visited {} node(s), released {released} autoreleased reference(s)",
            self.frame_count,
            stats.visited
        );
        stats
    }

    /// Hands the updated scene to the backend.
    ///
    /// Returns `true` if a frame was drawn, `false` if there is no backend or
    /// it skipped the frame.
    pub fn render(&mut self) -> bool {
        let frame = self.frame_state();
        match self.backend.as_mut() {
            Some(backend) => backend.draw(&self.scene, &frame),
            None => false,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SceneSettings::default())
    }
}

/// Per-frame timing information.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    /// Total elapsed time since the engine started (in seconds).
    pub time: f32,
    /// Delta time of the last update (in seconds).
    pub dt: f32,
    /// Total number of frames updated since startup.
    pub frame_count: u64,
}
