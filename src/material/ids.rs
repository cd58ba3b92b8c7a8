//! Strongly-typed identities for host material objects.
//!
//! Thin `Copy` wrappers around a process-unique `u64`. Techniques and passes
//! are destroyed and recreated underneath the generator, so they are tracked
//! by identity rather than by position. Using distinct newtypes prevents
//! accidentally mixing up technique and pass ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of a [`Technique`](super::Technique).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TechniqueId(u64);

impl TechniqueId {
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(next_object_id())
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Identity of a [`Pass`](super::Pass).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u64);

impl PassId {
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(next_object_id())
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "technique#{}", self.0)
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass#{}", self.0)
    }
}
