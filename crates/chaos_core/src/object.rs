//! Manual reference counting
//!
//! Provides the retain/release primitive every scene node carries, and the
//! per-frame pool that releases objects on the owner's behalf.
//!
//! # Design Principles
//! - Objects start with one reference, owned by whoever created them
//! - `retain` adds an owner, `release` removes one; reaching zero means the
//!   owner of the storage must destroy the object
//! - Releasing at zero is a programming error: it asserts in debug builds and
//!   is rejected with [`ChaosError::OverRelease`] otherwise
//! - [`AutoreleasePool`] defers a release to the end of the current frame

use crate::errors::{ChaosError, Result};

/// Reference count tracker embedded in reference-counted objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefCount {
    count: u32,
}

impl RefCount {
    /// Creates a tracker holding the creator's reference.
    #[must_use]
    pub fn new() -> Self {
        Self { count: 1 }
    }

    /// Increments the count, returns the new value.
    #[inline]
    pub fn retain(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    /// Decrements the count, returns the remaining value.
    ///
    /// A return value of `0` means the object must be destroyed now.
    #[inline]
    pub fn release(&mut self) -> Result<u32> {
        debug_assert!(self.count > 0, "object released with a zero reference count");
        if self.count == 0 {
            log::error!("Object released with a zero reference count");
            return Err(ChaosError::OverRelease);
        }
        self.count -= 1;
        Ok(self.count)
    }

    /// Gets the current count.
    #[inline]
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the next release destroys the object.
    #[inline]
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.count == 1
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

/// Deferred releases, drained once per frame.
///
/// Adding a key hands one reference to the pool; the caller no longer owns it.
#[derive(Debug)]
pub struct AutoreleasePool<K> {
    pending: Vec<K>,
}

impl<K> AutoreleasePool<K> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Hands one reference of `key` to the pool.
    #[inline]
    pub fn add(&mut self, key: K) {
        self.pending.push(key);
    }

    /// Number of references waiting for release.
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

    /// Takes every pending reference, in the order they were added.
    ///
    /// Objects autoreleased while the caller processes the returned list land
    /// in the next drain.
    pub fn drain(&mut self) -> Vec<K> {
        std::mem::take(&mut self.pending)
    }
}

impl<K> Default for AutoreleasePool<K> {
    fn default() -> Self {
        Self::new()
    }
}
