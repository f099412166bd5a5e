//! Change Counting
//!
//! CPU-side parameter blocks bump a [`ChangeTracker`] on every real change.
//! The GPU side remembers the last version it wrote and compares.

/// Monotonic change counter, starting at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    version: u64,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether anything changed since `synced` was read from [`version`](Self::version).
    #[inline]
    #[must_use]
    pub fn is_newer_than(&self, synced: u64) -> bool {
        self.version != synced
    }
}
