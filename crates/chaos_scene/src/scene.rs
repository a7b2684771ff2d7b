use chaos_core::errors::{ChaosError, Result};
use chaos_core::object::AutoreleasePool;
use slotmap::SlotMap;

use crate::node::{DirtyFlags, Node};
use crate::script::ScriptState;
use crate::settings::SceneSettings;
use crate::trigger::{Condition, TriggerAction, TriggerKey, TriggerRegistry};
use crate::wrapper::SceneNode;
use crate::NodeHandle;

/// Scene graph container.
///
/// The arena owns node storage; ownership *semantics* are carried by each
/// node's reference count:
///
/// - [`create_node`](Self::create_node) hands the caller one reference
/// - attaching a node gives its parent one reference, detaching releases it
/// - pending deferred actions hold one reference each
/// - the scene holds one reference on its root
///
/// A node is destroyed when its count reaches zero. It must be detached at
/// that point; its remaining children are detached and released.
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeHandle, Node>,
    pub(crate) root: NodeHandle,
    pub(crate) triggers: TriggerRegistry<TriggerAction>,
    pub(crate) autorelease: AutoreleasePool<NodeHandle>,
    pub(crate) settings: SceneSettings,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(SceneSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: SceneSettings) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(&settings.root_tag));
        Self {
            nodes,
            root,
            triggers: TriggerRegistry::new(),
            autorelease: AutoreleasePool::new(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Creates a detached node. The caller owns the returned reference.
    pub fn create_node(&mut self, tag: &str) -> NodeHandle {
        self.nodes.insert(Node::new(tag))
    }

    /// Creates a node directly under `parent`, owned by the tree only.
    pub fn add_to_parent(&mut self, parent: NodeHandle, tag: &str) -> Result<NodeHandle> {
        let child = self.create_node(tag);
        if let Err(err) = self.add_child(parent, child, None) {
            self.nodes.remove(child);
            return Err(err);
        }
        self.release(child)?;
        Ok(child)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Chainable editing wrapper, see [`SceneNode`].
    #[inline]
    pub fn node(&mut self, handle: NodeHandle) -> SceneNode<'_> {
        SceneNode::new(self, handle)
    }

    pub(crate) fn try_node(&self, handle: NodeHandle) -> Result<&Node> {
        self.nodes.get(handle).ok_or(ChaosError::StaleNode)
    }

    pub(crate) fn try_node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        self.nodes.get_mut(handle).ok_or(ChaosError::StaleNode)
    }

    pub(crate) fn tag_of(&self, handle: NodeHandle) -> String {
        self.nodes
            .get(handle)
            .map_or_else(|| "<stale>".to_owned(), |n| n.tag().to_owned())
    }

    pub fn mark_dirty(&mut self, handle: NodeHandle, flags: DirtyFlags) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.mark_dirty(flags);
        }
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    #[must_use]
    pub fn ref_count(&self, handle: NodeHandle) -> Option<u32> {
        self.nodes.get(handle).map(Node::ref_count)
    }

    /// Adds an owner to `handle`. Returns the new count.
    pub fn retain(&mut self, handle: NodeHandle) -> Result<u32> {
        Ok(self.try_node_mut(handle)?.ref_count.retain())
    }

    /// Removes an owner from `handle`, destroying the node at zero.
    ///
    /// Returns the remaining count; `0` means the node is gone. The scene
    /// holds the root's last reference: releasing it is refused with
    /// [`ChaosError::ReleaseRoot`].
    pub fn release(&mut self, handle: NodeHandle) -> Result<u32> {
        let Some(node) = self.nodes.get_mut(handle) else {
            log::error!("Release of a stale node handle");
            return Err(ChaosError::StaleNode);
        };

        if node.ref_count.is_last() {
            if handle == self.root {
                log::error!("Release of the scene root's own reference");
                return Err(ChaosError::ReleaseRoot);
            }
            let attached = node.is_attached();
            debug_assert!(!attached, "node '{}' destroyed while attached", node.tag());
            if attached {
                log::error!("Node '{}' released to zero while attached", node.tag());
                return Err(ChaosError::DestroyAttached(node.tag().to_owned()));
            }
        }

        let remaining = node.ref_count.release()?;
        if remaining == 0 {
            self.destroy(handle);
        }
        Ok(remaining)
    }

    /// Hands one reference of `handle` to the per-frame pool.
    pub fn autorelease(&mut self, handle: NodeHandle) -> Result<()> {
        self.try_node(handle)?;
        self.autorelease.add(handle);
        Ok(())
    }

    /// Releases every autoreleased reference. Returns how many were released.
    pub fn drain_autorelease(&mut self) -> usize {
        let pending = self.autorelease.drain();
        let mut released = 0;
        for handle in pending {
            match self.release(handle) {
                Ok(_) => released += 1,
                Err(err) => log::error!("Autorelease failed: {err}"),
            }
        }
        released
    }

    /// Destroys a node whose count reached zero, then releases its children.
    ///
    /// Iterative so that dropping a deep subtree cannot overflow the stack.
    fn destroy(&mut self, handle: NodeHandle) {
        let mut doomed = vec![handle];

        while let Some(handle) = doomed.pop() {
            let Some(node) = self.nodes.remove(handle) else {
                continue;
            };
            debug_assert!(node.parent.is_none());

            let mut child = node.first_child;
            while let Some(current) = child {
                let Some(c) = self.nodes.get_mut(current) else {
                    break;
                };
                child = c.next_sibling;
                c.parent = None;
                c.pre_sibling = None;
                c.next_sibling = None;

                match c.ref_count.release() {
                    Ok(0) => doomed.push(current),
                    Ok(_) => {}
                    Err(err) => log::error!("Releasing child of destroyed node failed: {err}"),
                }
            }

            if self.settings.log_lifecycle {
                log::debug!("Scene node is destroyed ({}: {handle:?})", node.tag());
            }
            // Components drop with `node` here.
        }
    }

    // ========================================================================
    // Deferred actions
    // ========================================================================

    /// Runs `action` on `node` once `condition` fires.
    ///
    /// The node is retained until the action fires or is cancelled.
    pub fn wait_for(
        &mut self,
        condition: Condition,
        node: NodeHandle,
        action: TriggerAction,
    ) -> Result<TriggerKey> {
        self.retain(node)?;
        Ok(self.triggers.wait_for(condition, node, action))
    }

    /// Detaches `node` from its parent once `condition` fires.
    pub fn remove_when_done(&mut self, node: NodeHandle, condition: Condition) -> Result<TriggerKey> {
        self.wait_for(condition, node, TriggerAction::RemoveNode)
    }

    /// Fires `condition`: every action waiting on it runs exactly once, in
    /// registration order, and then releases its node.
    ///
    /// Returns the number of actions run.
    pub fn fire(&mut self, condition: Condition) -> usize {
        let waiters = self.triggers.take_waiters(condition);
        let fired = waiters.len();

        for (node, action) in waiters {
            self.activate(node, action);
            if let Err(err) = self.release(node) {
                log::error!("Releasing node after trigger failed: {err}");
            }
        }

        if fired > 0 {
            log::debug!("Condition {} fired {fired} deferred action(s)", condition.id());
        }
        fired
    }

    /// Cancels a pending action without running it, releasing its node.
    pub fn cancel_trigger(&mut self, key: TriggerKey) -> bool {
        let Some((node, _action)) = self.triggers.cancel(key) else {
            return false;
        };
        if let Err(err) = self.release(node) {
            log::error!("Releasing node after cancel failed: {err}");
        }
        true
    }

    #[inline]
    #[must_use]
    pub fn is_trigger_pending(&self, key: TriggerKey) -> bool {
        self.triggers.contains(key)
    }

    /// Number of actions waiting on `condition`.
    #[must_use]
    pub fn pending_triggers(&self, condition: Condition) -> usize {
        self.triggers.waiting_on(condition)
    }

    fn activate(&mut self, node: NodeHandle, action: TriggerAction) {
        match action {
            TriggerAction::RemoveNode => {
                if let Err(err) = self.remove_self(node) {
                    log::warn!("Deferred removal failed: {err}");
                }
            }
            TriggerAction::ResumeScript(key) => {
                if let Some(slot) = self.nodes.get_mut(node).and_then(|n| n.script.as_mut())
                    && slot.key == key
                    && slot.state == ScriptState::Suspended
                {
                    slot.state = ScriptState::Idle;
                }
            }
            TriggerAction::Callback(callback) => callback(self, node),
        }
    }

    // ========================================================================
    // Animation
    // ========================================================================

    /// Advances every frame clock by `dt`. Nodes whose frame changed get their
    /// sprite region refreshed on the next update.
    pub fn advance_frames(&mut self, dt: f32) {
        for (_, node) in &mut self.nodes {
            if let Some(frame) = node.frame.as_mut()
                && frame.advance(dt)
            {
                node.dirty |= DirtyFlags::TRANSFORM;
            }
        }
    }
}
