//! Branch hints for the hot paths of the queues.

/// Marks the current branch as cold.
#[inline(always)]
#[cold]
pub(crate) const fn cold_path() {}

/// Indicates that a given condition is likely to be true.
#[inline(always)]
pub(crate) const fn likely(b: bool) -> bool {
    if !b {
        cold_path();
    }

    b
}

/// Indicates that a given condition is likely to be false.
#[inline(always)]
pub(crate) const fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
    }

    b
}
