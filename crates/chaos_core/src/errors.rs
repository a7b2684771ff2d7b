//! Error Types
//!
//! This module defines the error type shared by every Chaos crate.
//!
//! # Overview
//!
//! [`ChaosError`] covers three families of failures:
//! - Ownership misuse (over-release, destroying an attached node, stale handles)
//! - Rejected values crossing the script boundary
//! - Script execution and configuration failures
//!
//! Structural no-ops (moving a node that is already in place, removing a
//! detached node) are *not* errors and never produce a `ChaosError`.
//!
//! ```rust,ignore
//! use chaos_core::errors::{ChaosError, Result};
//!
//! fn detach(scene: &mut Scene, node: NodeHandle) -> Result<()> {
//!     scene.remove_self(node)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Chaos engine.
#[derive(Error, Debug)]
pub enum ChaosError {
    // ========================================================================
    // Ownership Errors
    // ========================================================================
    /// A reference count was released while already at zero.
    #[error("Object released with a zero reference count")]
    OverRelease,

    /// The last reference of a node was released while it was still attached.
    #[error("Node '{0}' would be destroyed while still attached to a parent")]
    DestroyAttached(String),

    /// The scene's own reference to its root was released.
    #[error("The scene root cannot be released by its last reference")]
    ReleaseRoot,

    /// The node handle does not refer to a live node.
    #[error("Stale node handle")]
    StaleNode,

    /// The script handle does not refer to a live script thread.
    #[error("Stale script handle")]
    StaleScript,

    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// The `after` sibling passed to an insertion is not a child of the target parent.
    #[error("Sibling '{0}' is not a child of the target parent")]
    InvalidSibling(String),

    /// The insertion would make a node its own ancestor.
    #[error("Cannot attach '{child}' below '{parent}': it would create a cycle")]
    CyclicHierarchy {
        /// Tag of the node being attached
        child: String,
        /// Tag of the requested parent
        parent: String,
    },

    // ========================================================================
    // Script Boundary Errors
    // ========================================================================
    /// A script value was expected to be an object instance but was not.
    #[error("Expected a scene object, found {0}")]
    NotAnInstance(&'static str),

    /// A script object had the wrong capability kind.
    #[error("Expected a {expected} object, found a {found} object")]
    WrongKind {
        /// The kind the operation accepts
        expected: &'static str,
        /// The kind that was supplied
        found: &'static str,
    },

    /// The requested method is not exposed to scripts.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The requested property is not exposed to scripts, or is read-only.
    #[error("Unknown or read-only property: {0}")]
    UnknownProperty(String),

    /// A method argument failed validation.
    #[error("Invalid argument {index} for '{method}': {reason}")]
    InvalidArgument {
        /// Method being called
        method: &'static str,
        /// Zero-based argument position
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    // ========================================================================
    // Script Execution & Configuration Errors
    // ========================================================================
    /// A script raised an error while being resumed.
    #[error("Script error: {0}")]
    Script(String),

    /// Settings could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Alias for `Result<T, ChaosError>`.
pub type Result<T> = std::result::Result<T, ChaosError>;
