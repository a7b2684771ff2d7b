//! Per-frame update pass.
//!
//! Nodes are visited parent before children. Each visit runs, in order:
//!
//! 1. the node's script slice, unless the script is suspended
//! 2. merging the parent's dirty flags into the node's
//! 3. the transform recompute (plus the sprite region refresh)
//! 4. the derived color recompute
//!
//! Scripts may mutate the tree while it is walked. The walk keeps a stack of
//! `(node, expected parent)` snapshots: a node that was destroyed or moved
//! elsewhere before its turn is skipped, and children a script attaches to
//! its own node are visited in the same pass.
//!
//! A node's dirty flags are cleared right after its own recompute; its
//! children inherit the flags it had at that point. Each node is visited at
//! most once per pass, so a node re-parented after its visit keeps the
//! flags set by the move and is recomputed on the next pass.

use glam::Vec4;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::components::NodeColor;
use crate::node::DirtyFlags;
use crate::scene::Scene;
use crate::script::{ScriptContext, ScriptKey, ScriptState, ScriptStatus};
use crate::trigger::TriggerAction;
use crate::NodeHandle;

/// Counters of one update pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub visited: usize,
    pub scripts_resumed: usize,
    pub scripts_suspended: usize,
    pub script_errors: usize,
}

impl Scene {
    /// Runs the update pass over the whole tree.
    pub fn update(&mut self, scripts: &mut ScriptContext) -> UpdateStats {
        self.update_subtree(self.root, scripts)
    }

    /// Runs the update pass over `start` and its descendants.
    pub fn update_subtree(&mut self, start: NodeHandle, scripts: &mut ScriptContext) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let Some(node) = self.nodes.get(start) else {
            return stats;
        };

        let inherited = node
            .parent
            .and_then(|p| self.nodes.get(p))
            .map_or(DirtyFlags::empty(), |p| p.dirty);

        let mut stack: Vec<(NodeHandle, Option<NodeHandle>, DirtyFlags)> = vec![(start, node.parent, inherited)];
        let mut visited: FxHashSet<NodeHandle> = FxHashSet::default();

        while let Some((handle, expected_parent, inherited)) = stack.pop() {
            if !self.is_child_of(handle, expected_parent) || !visited.insert(handle) {
                continue;
            }
            stats.visited += 1;

            self.run_script(handle, scripts, &mut stats);

            // The script may have detached or destroyed its own node.
            if !self.is_child_of(handle, expected_parent) {
                continue;
            }
            let dirty = self.update_node(handle, inherited);

            let children: SmallVec<[NodeHandle; 16]> = self.children_iter(handle).collect();
            stack.extend(children.into_iter().rev().map(|c| (c, Some(handle), dirty)));
        }
        stats
    }

    fn is_child_of(&self, handle: NodeHandle, parent: Option<NodeHandle>) -> bool {
        self.nodes.get(handle).is_some_and(|n| n.parent == parent)
    }

    /// Step 1: resumes the node's script for one slice.
    fn run_script(&mut self, handle: NodeHandle, scripts: &mut ScriptContext, stats: &mut UpdateStats) {
        let Some(slot) = self.nodes.get(handle).and_then(|n| n.script) else {
            return;
        };
        if slot.state != ScriptState::Idle || !scripts.contains(slot.key) {
            return;
        }

        // Keep the node alive while its script runs; the script may detach it.
        if self.retain(handle).is_err() {
            return;
        }
        self.set_script_state(handle, slot.key, ScriptState::Running);

        let budget = self.settings.script_slice;
        let outcome = scripts.resume(slot.key, self, handle, budget);
        stats.scripts_resumed += 1;

        match outcome {
            Some((condition, Ok(ScriptStatus::Yielded))) => {
                // Nothing to suspend if the script replaced itself.
                if self.set_script_state(handle, slot.key, ScriptState::Suspended) {
                    match self.wait_for(condition, handle, TriggerAction::ResumeScript(slot.key)) {
                        Ok(_) => stats.scripts_suspended += 1,
                        Err(err) => {
                            log::error!("Cannot suspend script: {err}");
                            self.set_script_state(handle, slot.key, ScriptState::Idle);
                        }
                    }
                }
            }
            Some((_, Err(err))) => {
                log::warn!("Script on node '{}' failed: {err}", self.tag_of(handle));
                stats.script_errors += 1;
                self.set_script_state(handle, slot.key, ScriptState::Idle);
            }
            Some((_, Ok(ScriptStatus::Finished))) | None => {
                self.set_script_state(handle, slot.key, ScriptState::Idle);
            }
        }

        if let Err(err) = self.release(handle) {
            log::error!("Releasing node after its script slice failed: {err}");
        }
    }

    /// Updates the script state only if the node still runs `key`; a script
    /// may replace its own node's script. Returns whether it applied.
    fn set_script_state(&mut self, handle: NodeHandle, key: ScriptKey, state: ScriptState) -> bool {
        match self.nodes.get_mut(handle).and_then(|n| n.script.as_mut()) {
            Some(slot) if slot.key == key => {
                slot.state = state;
                true
            }
            _ => false,
        }
    }

    /// Steps 2 to 4. Clears the node's flags and returns the ones it had,
    /// for its children to inherit.
    fn update_node(&mut self, handle: NodeHandle, inherited: DirtyFlags) -> DirtyFlags {
        let Some(parent) = self.nodes.get(handle).map(|n| n.parent) else {
            return DirtyFlags::empty();
        };
        let parent_color = parent
            .and_then(|p| self.nodes.get(p))
            .and_then(|p| p.color.as_ref())
            .map_or(Vec4::ONE, NodeColor::derived);
        let parent_world = self.world_matrix_of(parent);

        let node = &mut self.nodes[handle];
        node.dirty |= inherited;

        if node.dirty.contains(DirtyFlags::TRANSFORM)
            && let Some(transform) = node.transform.as_mut()
        {
            transform.update_transform(&parent_world);
            let frame = node.animation_frame();
            if let (Some(sprite), Some(frame)) = (node.sprite.as_mut(), frame) {
                sprite.update_region(frame);
            }
        }

        if node.dirty.contains(DirtyFlags::COLOR)
            && let Some(color) = node.color.as_mut()
        {
            color.update_color(parent_color);
        }

        std::mem::take(&mut node.dirty)
    }
}
