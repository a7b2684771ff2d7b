//! Tree topology operations.
//!
//! Children are kept in an intrusive doubly-linked list (`first_child`,
//! `next_sibling`, `pre_sibling`). Every operation here keeps these
//! invariants:
//!
//! - a detached node has no parent and no siblings
//! - the first child has no `pre_sibling`
//! - for adjacent siblings `a`, `b`: `a.next == b` iff `b.pre == a`
//! - a node is attached to at most one parent, which holds one reference on it
//!
//! Links only ever point at live nodes (an attached node is owned by its
//! parent, and a destroyed node detaches its children first), so link
//! targets are indexed directly.
//!
//! Operations on nodes that are already where they were asked to go, or
//! that have no parent, return `Ok(())` without touching anything.

use chaos_core::errors::{ChaosError, Result};
use chaos_core::interner;
use glam::Affine2;
use smallvec::SmallVec;

use crate::node::DirtyFlags;
use crate::scene::Scene;
use crate::NodeHandle;

impl Scene {
    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle)?.parent
    }

    #[must_use]
    pub fn first_child(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle)?.first_child
    }

    #[must_use]
    pub fn next_sibling(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle)?.next_sibling
    }

    #[must_use]
    pub fn pre_sibling(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle)?.pre_sibling
    }

    /// Iterates the direct children of `handle` in sibling order.
    pub fn children_iter(&self, handle: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        let first = self.nodes.get(handle).and_then(|n| n.first_child);
        std::iter::successors(first, |&c| self.nodes.get(c).and_then(|n| n.next_sibling))
    }

    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        self.children_iter(handle).collect()
    }

    #[must_use]
    pub fn child_count(&self, handle: NodeHandle) -> usize {
        self.children_iter(handle).count()
    }

    #[must_use]
    pub fn last_child(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.children_iter(handle).last()
    }

    /// Whether `ancestor` is `node` itself or one of its parents.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.nodes.get(h).and_then(|n| n.parent);
        }
        false
    }

    /// Depth-first pre-order search starting at `handle` itself.
    ///
    /// Returns the first node tagged `tag`; an empty tag never matches.
    #[must_use]
    pub fn child_by_tag(&self, handle: NodeHandle, tag: &str) -> Option<NodeHandle> {
        if tag.is_empty() || !self.contains(handle) {
            return None;
        }
        // A string that was never interned cannot be any node's tag.
        let symbol = interner::get(tag)?;

        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.tag == symbol {
                return Some(current);
            }
            let children: SmallVec<[NodeHandle; 8]> = self.children_iter(current).collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Direct child by position.
    ///
    /// Negative indices count from the front: `-1` is the first child, `-2`
    /// the second. Non-negative indices count from the back: `1` (and `0`)
    /// is the last child, `2` the one before it. Out of range gives `None`.
    #[must_use]
    pub fn child_by_index(&self, handle: NodeHandle, index: i32) -> Option<NodeHandle> {
        let node = self.nodes.get(handle)?;
        let mut index = index;

        if index < 0 {
            let mut current = node.first_child;
            while let Some(c) = current {
                index += 1;
                if index >= 0 {
                    break;
                }
                current = self.nodes[c].next_sibling;
            }
            current
        } else {
            let mut current = self.last_child(handle);
            while let Some(c) = current {
                index -= 1;
                if index <= 0 {
                    break;
                }
                current = self.nodes[c].pre_sibling;
            }
            current
        }
    }

    // ========================================================================
    // Attach / Detach
    // ========================================================================

    /// Checks that `child` may be inserted under `parent` after `after`.
    fn check_attach(
        &self,
        parent: NodeHandle,
        child: NodeHandle,
        after: Option<NodeHandle>,
    ) -> Result<()> {
        self.try_node(parent)?;
        self.try_node(child)?;

        if self.is_ancestor(child, parent) {
            return Err(ChaosError::CyclicHierarchy {
                child: self.tag_of(child),
                parent: self.tag_of(parent),
            });
        }
        if let Some(after) = after {
            let sibling = self.try_node(after)?;
            if after == child || sibling.parent != Some(parent) {
                return Err(ChaosError::InvalidSibling(self.tag_of(after)));
            }
        }
        Ok(())
    }

    fn is_in_position(
        &self,
        parent: NodeHandle,
        child: NodeHandle,
        after: Option<NodeHandle>,
    ) -> bool {
        self.nodes.get(child).is_some_and(|c| {
            c.parent == Some(parent) && (after == Some(child) || c.pre_sibling == after)
        })
    }

    /// Attaches `child` under `parent`, right after `after` or as the first
    /// child when `after` is `None`.
    ///
    /// A child attached elsewhere is detached first. The parent takes one
    /// reference, and the child is marked fully dirty.
    pub fn add_child(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        after: Option<NodeHandle>,
    ) -> Result<()> {
        if self.is_in_position(parent, child, after) {
            return Ok(());
        }
        self.check_attach(parent, child, after)?;

        self.retain(child)?;
        if self.nodes[child].parent.is_some() {
            self.remove_self(child)?;
        }

        if let Some(after) = after {
            let next = self.nodes[after].next_sibling;
            let node = &mut self.nodes[child];
            node.next_sibling = next;
            node.pre_sibling = Some(after);
            self.nodes[after].next_sibling = Some(child);
            if let Some(next) = next {
                self.nodes[next].pre_sibling = Some(child);
            }
        } else {
            let first = self.nodes[parent].first_child;
            let node = &mut self.nodes[child];
            node.next_sibling = first;
            node.pre_sibling = None;
            if let Some(first) = first {
                self.nodes[first].pre_sibling = Some(child);
            }
            self.nodes[parent].first_child = Some(child);
        }

        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.dirty = DirtyFlags::ALL;
        log::trace!(
            "Attached '{}' under '{}'",
            self.nodes[child].tag(),
            self.nodes[parent].tag()
        );
        Ok(())
    }

    /// Attaches each live handle in order, starting right after `after`.
    ///
    /// Stale handles are logged and skipped. Returns the number attached.
    pub fn add_children(
        &mut self,
        parent: NodeHandle,
        children: &[NodeHandle],
        after: Option<NodeHandle>,
    ) -> Result<usize> {
        self.try_node(parent)?;
        let mut after = after;
        let mut added = 0;
        for &child in children {
            match self.add_child(parent, child, after) {
                Ok(()) => {
                    after = Some(child);
                    added += 1;
                }
                Err(err) => log::warn!("Skipping child: {err}"),
            }
        }
        Ok(added)
    }

    /// Detaches `handle` from its parent and releases the parent's reference.
    ///
    /// No-op for a detached node.
    pub fn remove_self(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.try_node(handle)?;
        let Some(parent) = node.parent else {
            return Ok(());
        };
        let (next, pre) = (node.next_sibling, node.pre_sibling);

        if let Some(next) = next {
            self.nodes[next].pre_sibling = pre;
        }
        if let Some(pre) = pre {
            self.nodes[pre].next_sibling = next;
        }
        if self.nodes[parent].first_child == Some(handle) {
            self.nodes[parent].first_child = next;
        }

        let node = &mut self.nodes[handle];
        node.parent = None;
        node.next_sibling = None;
        node.pre_sibling = None;
        log::trace!("Detached '{}'", node.tag());

        self.release(handle)?;
        Ok(())
    }

    /// Detaches every live handle. Stale handles are logged and skipped.
    pub fn remove_children(&mut self, children: &[NodeHandle]) -> usize {
        let mut removed = 0;
        for &child in children {
            match self.remove_self(child) {
                Ok(()) => removed += 1,
                Err(err) => log::warn!("Skipping child: {err}"),
            }
        }
        removed
    }

    /// Detaches and releases every direct child.
    pub fn remove_all_children(&mut self, handle: NodeHandle) -> Result<()> {
        let mut child = self.try_node_mut(handle)?.first_child.take();

        while let Some(current) = child {
            let node = &mut self.nodes[current];
            child = node.next_sibling;
            node.parent = None;
            node.next_sibling = None;
            node.pre_sibling = None;
            if let Err(err) = self.release(current) {
                log::error!("Releasing removed child failed: {err}");
            }
        }
        Ok(())
    }

    // ========================================================================
    // Reordering
    // ========================================================================

    /// Swaps `handle` with its next sibling.
    pub fn move_upward(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.try_node(handle)?;
        let (Some(parent), Some(next)) = (node.parent, node.next_sibling) else {
            return Ok(());
        };
        let pre = node.pre_sibling;
        let next_next = self.nodes[next].next_sibling;

        match pre {
            Some(pre) => self.nodes[pre].next_sibling = Some(next),
            None => self.nodes[parent].first_child = Some(next),
        }
        self.nodes[next].pre_sibling = pre;
        if let Some(next_next) = next_next {
            self.nodes[next_next].pre_sibling = Some(handle);
        }

        let node = &mut self.nodes[handle];
        node.pre_sibling = Some(next);
        node.next_sibling = next_next;
        self.nodes[next].next_sibling = Some(handle);
        Ok(())
    }

    /// Swaps `handle` with its previous sibling.
    pub fn move_downward(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.try_node(handle)?;
        let (Some(parent), Some(pre)) = (node.parent, node.pre_sibling) else {
            return Ok(());
        };
        let next = node.next_sibling;
        let pre_pre = self.nodes[pre].pre_sibling;

        if let Some(next) = next {
            self.nodes[next].pre_sibling = Some(pre);
        }
        let previous = &mut self.nodes[pre];
        previous.next_sibling = next;
        previous.pre_sibling = Some(handle);

        let node = &mut self.nodes[handle];
        node.next_sibling = Some(pre);
        node.pre_sibling = pre_pre;

        match pre_pre {
            Some(pre_pre) => self.nodes[pre_pre].next_sibling = Some(handle),
            None => self.nodes[parent].first_child = Some(handle),
        }
        Ok(())
    }

    /// Moves `handle` to the end of its sibling list.
    pub fn move_top(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.try_node(handle)?;
        let (Some(parent), Some(next)) = (node.parent, node.next_sibling) else {
            return Ok(());
        };
        let pre = node.pre_sibling;
        let Some(last) = self.last_child(parent) else {
            return Ok(());
        };

        self.nodes[next].pre_sibling = pre;
        match pre {
            Some(pre) => self.nodes[pre].next_sibling = Some(next),
            None => self.nodes[parent].first_child = Some(next),
        }

        self.nodes[last].next_sibling = Some(handle);
        let node = &mut self.nodes[handle];
        node.pre_sibling = Some(last);
        node.next_sibling = None;
        Ok(())
    }

    /// Moves `handle` to the front of its sibling list.
    ///
    /// Goes through a full detach/attach round-trip; the node is retained
    /// across it so it survives even when the parent held its only reference.
    pub fn move_bottom(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.try_node(handle)?;
        let (Some(parent), Some(_)) = (node.parent, node.pre_sibling) else {
            return Ok(());
        };

        self.retain(handle)?;
        let moved = self
            .remove_self(handle)
            .and_then(|()| self.add_child(parent, handle, None));
        self.release(handle)?;
        moved
    }

    /// Re-parents `handle` under `new_parent` after `after`, keeping its world
    /// placement.
    ///
    /// No-op unless both nodes carry a transform, or when the node is already
    /// at the requested position.
    pub fn relocate_to(
        &mut self,
        handle: NodeHandle,
        new_parent: NodeHandle,
        after: Option<NodeHandle>,
    ) -> Result<()> {
        let node = self.try_node(handle)?;
        let target = self.try_node(new_parent)?;
        if node.transform.is_none()
            || target.transform.is_none()
            || (node.parent == Some(new_parent) && node.pre_sibling == after)
        {
            return Ok(());
        }
        self.check_attach(new_parent, handle, after)?;

        let parent_world = self.world_matrix_of(node.parent);
        let new_parent_world = self.world_matrix_of(Some(new_parent));
        if let Some(transform) = self.nodes[handle].transform.as_mut() {
            transform.force_update(&parent_world);
            transform.relocate(&new_parent_world);
        }

        self.add_child(new_parent, handle, after)
    }

    /// Cached world matrix of `handle`, identity when absent.
    pub(crate) fn world_matrix_of(&self, handle: Option<NodeHandle>) -> Affine2 {
        handle
            .and_then(|h| self.nodes.get(h))
            .and_then(|n| n.transform.as_ref())
            .map_or(Affine2::IDENTITY, |t| *t.world_matrix())
    }
}
