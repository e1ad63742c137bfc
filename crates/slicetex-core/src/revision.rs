//! Per-object revision tracking.
//!
//! Each tracked input owns a [`Revision`]: an object identity plus a version
//! that every mutating setter bumps. Caches keep the [`Stamp`] they were built
//! from and compare it for equality.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Snapshot of a [`Revision`] at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    object: u64,
    version: u64,
}

/// Identity and modification count of a tracked object.
///
/// Cloning yields a new identity, so a clone never aliases the original's stamps.
#[derive(Debug, PartialEq, Eq)]
pub struct Revision {
    object: u64,
    version: u64,
}

impl Revision {
    pub fn new() -> Self {
        Self {
            object: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            version: 0,
        }
    }

    /// Records a modification.
    pub fn bump(&mut self) {
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stamp(&self) -> Stamp {
        Stamp {
            object: self.object,
            version: self.version,
        }
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Revision {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_changes_stamp() {
        let mut r = Revision::new();
        let before = r.stamp();
        assert_eq!(before, r.stamp());
        r.bump();
        assert_ne!(before, r.stamp());
        assert_eq!(r.version(), 1);
    }

    #[test]
    fn test_clone_has_new_identity() {
        let r = Revision::new();
        let c = r.clone();
        assert_ne!(r.stamp(), c.stamp());
    }
}
