//! Script scheduling context.
//!
//! The scripting runtime itself is an external collaborator; the scene only
//! sees it through [`ScriptThread`]. A [`ScriptContext`] owns the threads and
//! is passed explicitly into every update pass.
//!
//! # Suspension
//!
//! Each node with a script moves through [`ScriptState`]:
//!
//! ```text
//! Idle --resume--> Running --Finished--> Idle
//!                         \--Yielded--> Suspended --thread condition fires--> Idle
//! ```
//!
//! While `Suspended` the node's script step is skipped. The scene registers a
//! [`TriggerAction::ResumeScript`](crate::TriggerAction::ResumeScript) on the
//! thread's [`Condition`]; whoever drives the thread fires it with
//! [`ScriptContext::wake`]. A thread that is never woken stalls its node
//! forever.

use chaos_core::errors::Result;
use slotmap::{new_key_type, SlotMap};

use crate::scene::Scene;
use crate::trigger::Condition;
use crate::NodeHandle;

new_key_type! {
    pub struct ScriptKey;
}

/// Outcome of one cooperative slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptStatus {
    /// The script ran to completion; it runs again next frame.
    Finished,
    /// The script yielded and waits for its thread condition.
    Yielded,
}

/// Per-node script state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScriptState {
    #[default]
    Idle,
    Running,
    Suspended,
}

/// A node's script attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptSlot {
    pub key: ScriptKey,
    pub state: ScriptState,
}

impl ScriptSlot {
    #[must_use]
    pub fn new(key: ScriptKey) -> Self {
        Self {
            key,
            state: ScriptState::Idle,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.state == ScriptState::Suspended
    }
}

/// What a script sees while it is being resumed.
///
/// Scripts may freely mutate the tree, including removing or re-parenting
/// their own node. `scripts` is what the binding surface needs to resolve
/// thread values:
///
/// ```rust,ignore
/// NodeBinding::call(call.scene, call.scripts, &ScriptValue::node(call.node), "removeWhen", &[thread])?;
/// ```
pub struct ScriptCall<'a> {
    pub scene: &'a mut Scene,
    /// The context that owns the running thread.
    pub scripts: &'a ScriptContext,
    /// The node whose script is running.
    pub node: NodeHandle,
    /// Slice budget from [`SceneSettings::script_slice`](crate::SceneSettings).
    pub budget: u32,
}

/// A resumable script, implemented by the embedding runtime.
pub trait ScriptThread {
    /// Runs one slice.
    ///
    /// Errors are logged by the update pass and abort only this node's script
    /// step.
    fn resume(&mut self, call: &mut ScriptCall<'_>) -> Result<ScriptStatus>;
}

impl<F> ScriptThread for F
where
    F: FnMut(&mut ScriptCall<'_>) -> Result<ScriptStatus>,
{
    fn resume(&mut self, call: &mut ScriptCall<'_>) -> Result<ScriptStatus> {
        self(call)
    }
}

struct ScriptEntry {
    /// `None` while the thread is running its slice.
    thread: Option<Box<dyn ScriptThread>>,
    condition: Condition,
}

/// Owner of all script threads.
pub struct ScriptContext {
    threads: SlotMap<ScriptKey, ScriptEntry>,
}

impl ScriptContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            threads: SlotMap::with_key(),
        }
    }

    /// Registers a thread and allocates its completion condition.
    pub fn spawn(&mut self, thread: impl ScriptThread + 'static) -> ScriptKey {
        self.threads.insert(ScriptEntry {
            thread: Some(Box::new(thread)),
            condition: Condition::new(),
        })
    }

    /// Drops a thread. Nodes suspended on it are woken so their pending
    /// actions release the nodes; their script steps are skipped afterwards.
    pub fn remove(&mut self, scene: &mut Scene, key: ScriptKey) -> bool {
        let Some(entry) = self.threads.remove(key) else {
            return false;
        };
        scene.fire(entry.condition);
        true
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: ScriptKey) -> bool {
        self.threads.contains_key(key)
    }

    #[must_use]
    pub fn condition_of(&self, key: ScriptKey) -> Option<Condition> {
        self.threads.get(key).map(|e| e.condition)
    }

    /// Signals that the thread's pending wait completed, waking every node
    /// suspended on it. Returns the number of actions fired.
    pub fn wake(&self, scene: &mut Scene, key: ScriptKey) -> usize {
        match self.threads.get(key) {
            Some(entry) => scene.fire(entry.condition),
            None => {
                log::warn!("Attempted to wake an unknown script thread");
                0
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Resumes one slice of `key` on behalf of `node`.
    ///
    /// The thread is taken out of its entry for the slice so the script can
    /// see the rest of the context. Returns the thread's completion condition
    /// alongside the outcome.
    pub(crate) fn resume(
        &mut self,
        key: ScriptKey,
        scene: &mut Scene,
        node: NodeHandle,
        budget: u32,
    ) -> Option<(Condition, Result<ScriptStatus>)> {
        let entry = self.threads.get_mut(key)?;
        let condition = entry.condition;
        let mut thread = entry.thread.take()?;

        let status = thread.resume(&mut ScriptCall {
            scene,
            scripts: self,
            node,
            budget,
        });

        if let Some(entry) = self.threads.get_mut(key) {
            entry.thread = Some(thread);
        }
        Some((condition, status))
    }
}

impl Default for ScriptContext {
    fn default() -> Self {
        Self::new()
    }
}
