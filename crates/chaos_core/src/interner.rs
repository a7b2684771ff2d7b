//! Global tag interner
//!
//! Node tags are compared on every `child_by_tag` step, so they are stored as
//! interned [`Symbol`]s and compared in O(1). A lookup for a string that was
//! never interned cannot match any node and short-circuits.
//!
//! The interner is process-global and never shrinks: every distinct tag ever
//! given to a node stays resident, even after the node is destroyed. Tags are
//! meant to be a small fixed vocabulary; generating unique tags per node
//! (counters, ids) grows it without bound.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact identifier of an interned string.
pub type Symbol = Spur;

/// Interns `s`, returning the existing symbol if it was seen before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the symbol of `s` without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}
