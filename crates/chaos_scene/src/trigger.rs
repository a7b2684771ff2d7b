//! Deferred actions ("wait for condition, then act").
//!
//! A [`Condition`] is anything that can fire later: a gate owned by game
//! code, or the completion signal of a script thread. Actions registered on
//! a condition hold a reference to the node they act on, so the node stays
//! alive until the action either fires or is cancelled.
//!
//! [`TriggerRegistry`] only keeps the bookkeeping (which action waits on
//! which condition, in which order). Retaining and releasing the captured
//! node, and running the action, is done by [`Scene`](crate::Scene):
//! [`Scene::wait_for`](crate::Scene::wait_for), [`Scene::fire`](crate::Scene::fire)
//! and [`Scene::cancel_trigger`](crate::Scene::cancel_trigger).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::scene::Scene;
use crate::script::ScriptKey;
use crate::NodeHandle;

static NEXT_CONDITION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a condition source, unique for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Condition(u64);

impl Condition {
    /// Allocates a fresh condition source.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_CONDITION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

new_key_type! {
    pub struct TriggerKey;
}

/// What happens to the captured node when its condition fires.
pub enum TriggerAction {
    /// Detach the node from its parent (`removeWhen`).
    RemoveNode,
    /// Clear the node's suspended state so its script runs again next frame.
    /// Ignored once the node runs a different script.
    ResumeScript(ScriptKey),
    /// Arbitrary one-shot callback.
    Callback(Box<dyn FnOnce(&mut Scene, NodeHandle)>),
}

impl fmt::Debug for TriggerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveNode => f.write_str("RemoveNode"),
            Self::ResumeScript(key) => f.debug_tuple("ResumeScript").field(key).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[derive(Debug)]
struct PendingTrigger<A> {
    condition: Condition,
    node: NodeHandle,
    action: A,
}

/// Pending actions keyed by the condition they wait on.
///
/// Each action is handed out at most once: either by
/// [`take_waiters`](Self::take_waiters) when its condition fires or by
/// [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct TriggerRegistry<A> {
    pending: SlotMap<TriggerKey, PendingTrigger<A>>,
    waiters: FxHashMap<Condition, Vec<TriggerKey>>,
}

impl<A> TriggerRegistry<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: SlotMap::with_key(),
            waiters: FxHashMap::default(),
        }
    }

    /// Registers `action` on `condition`. Waiters fire in registration order.
    pub fn wait_for(&mut self, condition: Condition, node: NodeHandle, action: A) -> TriggerKey {
        let key = self.pending.insert(PendingTrigger {
            condition,
            node,
            action,
        });
        self.waiters.entry(condition).or_default().push(key);
        key
    }

    /// Removes and returns every action currently waiting on `condition`.
    ///
    /// Actions registered on the same condition after this call wait for its
    /// next firing.
    pub fn take_waiters(&mut self, condition: Condition) -> Vec<(NodeHandle, A)> {
        let Some(keys) = self.waiters.remove(&condition) else {
            return Vec::new();
        };
        keys.into_iter()
            .filter_map(|key| self.pending.remove(key))
            .map(|p| (p.node, p.action))
            .collect()
    }

    /// Removes a pending action without running it.
    pub fn cancel(&mut self, key: TriggerKey) -> Option<(NodeHandle, A)> {
        let pending = self.pending.remove(key)?;
        if let Some(keys) = self.waiters.get_mut(&pending.condition) {
            keys.retain(|&k| k != key);
            if keys.is_empty() {
                self.waiters.remove(&pending.condition);
            }
        }
        Some((pending.node, pending.action))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: TriggerKey) -> bool {
        self.pending.contains_key(key)
    }

    #[must_use]
    pub fn condition_of(&self, key: TriggerKey) -> Option<Condition> {
        self.pending.get(key).map(|p| p.condition)
    }

    /// Number of actions waiting on `condition`.
    #[must_use]
    pub fn waiting_on(&self, condition: Condition) -> usize {
        self.waiters.get(&condition).map_or(0, Vec::len)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<A> Default for TriggerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn handle(n: u64) -> NodeHandle {
        NodeHandle::from(KeyData::from_ffi(n))
    }

    #[test]
    fn test_conditions_are_unique() {
        let a = Condition::new();
        let b = Condition::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_waiters_taken_in_registration_order_once() {
        let gate = Condition::new();
        let mut registry = TriggerRegistry::new();
        registry.wait_for(gate, handle(1), "first");
        registry.wait_for(gate, handle(2), "second");
        assert_eq!(registry.waiting_on(gate), 2);

        let fired: Vec<_> = registry.take_waiters(gate).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec!["first", "second"]);

        assert!(registry.take_waiters(gate).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_removes_only_that_action() {
        let gate = Condition::new();
        let mut registry = TriggerRegistry::new();
        let a = registry.wait_for(gate, handle(1), 1);
        let b = registry.wait_for(gate, handle(2), 2);

        assert_eq!(registry.cancel(a).map(|(_, v)| v), Some(1));
        assert!(registry.cancel(a).is_none());
        assert!(registry.contains(b));

        let fired: Vec<_> = registry.take_waiters(gate).into_iter().map(|(_, v)| v).collect();
        assert_eq!(fired, vec![2]);
    }

    #[test]
    fn test_conditions_are_independent() {
        let gate_a = Condition::new();
        let gate_b = Condition::new();
        let mut registry = TriggerRegistry::new();
        registry.wait_for(gate_a, handle(1), 'a');
        let b = registry.wait_for(gate_b, handle(1), 'b');

        assert_eq!(registry.take_waiters(gate_a).len(), 1);
        assert_eq!(registry.condition_of(b), Some(gate_b));
        assert_eq!(registry.len(), 1);
    }
}
