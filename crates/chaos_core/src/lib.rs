//! Foundational types shared by the Chaos crates.
//!
//! - [`object`]: manual reference counting and the autorelease pool
//! - [`interner`]: global string interning for node tags
//! - [`errors`]: the shared [`ChaosError`] type

pub mod errors;
pub mod interner;
pub mod object;

pub use errors::{ChaosError, Result};
pub use interner::Symbol;
pub use object::{AutoreleasePool, RefCount};
