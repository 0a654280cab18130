//! This module contains a lock for tests.
//!
//! Multi-threaded tests spawn more threads than there are cores;
//! running them one at a time keeps spinning consumers from starving each other.
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes heavy multi-threaded tests.
pub(crate) struct TestLock(Mutex<()>);

impl TestLock {
    /// Locks, ignoring poisoning left by a failed test.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lock for tests.
pub(crate) static TEST_LOCK: TestLock = TestLock(Mutex::new(()));
