use bitflags::bitflags;
use chaos_core::interner::{self, Symbol};
use chaos_core::object::RefCount;

use crate::components::{NodeColor, NodeFrame, NodeUI, Sprite, Transform};
use crate::script::{ScriptKey, ScriptSlot};
use crate::NodeHandle;

bitflags! {
    /// Derived state that needs recomputation on the next update.
    ///
    /// An empty set is the "clear" state. During its visit in an update pass
    /// a node's flags only grow (its parent's flags are OR-ed in); they are
    /// cleared once the node has been recomputed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        const TRANSFORM = 1 << 0;
        const COLOR     = 1 << 1;
        const ALL = Self::TRANSFORM.bits() | Self::COLOR.bits();
    }
}

/// A scene-graph entity.
///
/// # Hierarchy
///
/// Children form an intrusive doubly-linked list: the parent points at its
/// first child and siblings link to each other through `next_sibling` and
/// `pre_sibling`. All links are handles into the owning [`Scene`](crate::Scene)
/// arena. A parent holds one reference on each attached child.
///
/// # Components
///
/// Zero or one of each: transform, color, frame clock, sprite, UI, script.
#[derive(Debug)]
pub struct Node {
    pub(crate) tag: Symbol,
    pub(crate) ref_count: RefCount,

    // === Hierarchy links ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) first_child: Option<NodeHandle>,
    pub(crate) next_sibling: Option<NodeHandle>,
    pub(crate) pre_sibling: Option<NodeHandle>,

    pub(crate) dirty: DirtyFlags,

    // === Components ===
    pub(crate) transform: Option<Transform>,
    pub(crate) color: Option<NodeColor>,
    pub(crate) frame: Option<NodeFrame>,
    pub(crate) sprite: Option<Sprite>,
    pub(crate) ui: Option<NodeUI>,
    pub(crate) script: Option<ScriptSlot>,
}

impl Node {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: interner::intern(tag),
            ref_count: RefCount::new(),
            parent: None,
            first_child: None,
            next_sibling: None,
            pre_sibling: None,
            dirty: DirtyFlags::empty(),
            transform: None,
            color: None,
            frame: None,
            sprite: None,
            ui: None,
            script: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &'static str {
        interner::resolve(self.tag)
    }

    #[inline]
    #[must_use]
    pub fn tag_symbol(&self) -> Symbol {
        self.tag
    }

    #[inline]
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count.count()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn first_child(&self) -> Option<NodeHandle> {
        self.first_child
    }

    #[inline]
    #[must_use]
    pub fn next_sibling(&self) -> Option<NodeHandle> {
        self.next_sibling
    }

    #[inline]
    #[must_use]
    pub fn pre_sibling(&self) -> Option<NodeHandle> {
        self.pre_sibling
    }

    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    #[inline]
    #[must_use]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    // ========================================================================
    // Component access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Mutable transform access; marks the transform dirty.
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        if self.transform.is_some() {
            self.dirty |= DirtyFlags::TRANSFORM;
        }
        self.transform.as_mut()
    }

    /// Replaces the transform, dropping the previous one.
    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.transform = transform;
        self.dirty |= DirtyFlags::TRANSFORM;
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> Option<&NodeColor> {
        self.color.as_ref()
    }

    /// Mutable color access; marks the color dirty.
    pub fn color_mut(&mut self) -> Option<&mut NodeColor> {
        if self.color.is_some() {
            self.dirty |= DirtyFlags::COLOR;
        }
        self.color.as_mut()
    }

    pub fn set_color(&mut self, color: Option<NodeColor>) {
        self.color = color;
        self.dirty |= DirtyFlags::COLOR;
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> Option<&NodeFrame> {
        self.frame.as_ref()
    }

    pub fn frame_mut(&mut self) -> Option<&mut NodeFrame> {
        self.frame.as_mut()
    }

    pub fn set_frame(&mut self, frame: Option<NodeFrame>) {
        self.frame = frame;
        self.dirty |= DirtyFlags::TRANSFORM;
    }

    #[inline]
    #[must_use]
    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        self.sprite.as_mut()
    }

    /// Replaces the sprite. The region is refreshed with the transform step.
    pub fn set_sprite(&mut self, sprite: Option<Sprite>) {
        self.sprite = sprite;
        self.dirty |= DirtyFlags::TRANSFORM;
    }

    #[inline]
    #[must_use]
    pub fn ui(&self) -> Option<&NodeUI> {
        self.ui.as_ref()
    }

    pub fn ui_mut(&mut self) -> Option<&mut NodeUI> {
        self.ui.as_mut()
    }

    pub fn set_ui(&mut self, ui: Option<NodeUI>) {
        self.ui = ui;
    }

    #[inline]
    #[must_use]
    pub fn script(&self) -> Option<&ScriptSlot> {
        self.script.as_ref()
    }

    /// Attaches a script thread, or detaches with `None`. The new script
    /// starts idle.
    pub fn set_script(&mut self, key: Option<ScriptKey>) {
        self.script = key.map(ScriptSlot::new);
    }

    /// Sprite frame the update pass samples: the frame clock wins over the
    /// sprite's own frame.
    pub(crate) fn animation_frame(&self) -> Option<usize> {
        let sprite = self.sprite.as_ref()?;
        Some(self.frame.as_ref().map_or(sprite.frame(), NodeFrame::current))
    }
}
