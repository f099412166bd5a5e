//! Allocation Identity
//!
//! GPU handles do not expose a cheap, comparable identity. [`Tracked`] pairs
//! a resource with a process-unique id taken at wrap time, so the fog
//! targets and the volume buffer can report whether `setup` or an upload
//! kept an allocation or replaced it.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ALLOCATION_ID: AtomicU64 = AtomicU64::new(1);

/// A resource plus the id of the allocation it came from.
///
/// Clones share the id: they refer to the same allocation.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    id: u64,
}

impl<T> Tracked<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            id: NEXT_ALLOCATION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether `other` wraps the same allocation.
    #[inline]
    #[must_use]
    pub fn same_allocation(&self, other: &Self) -> bool {
        self.id == other.id
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
