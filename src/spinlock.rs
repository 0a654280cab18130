//! This module provides the [`RawSpinlock`] and its `lock_api` wrappers
//! [`Spinlock`] and [`SpinlockGuard`].
use crate::backoff::{spin_then_yield, DEFAULT_SPIN_COUNT};
use crate::trace::trace;
use core::fmt;
use lock_api::{GuardSend, RawMutex};
// `RawMutex::INIT` needs a const constructor, loom atomics don't have one.
use std::sync::atomic::{AtomicBool, Ordering};

/// A test-and-set spinlock over a single lock word.
///
/// Applications should use it only for very short critical sections:
/// while it is contended the waiting thread keeps running, so the OS scheduler
/// can't suspend it. Before choosing it over [`std::sync::Mutex`], profile.
///
/// [`lock_with`](Self::lock_with) busy-spins for a given number of failed attempts
/// and then yields the timeslice on every further failed attempt.
/// It never times out. There is no fairness and no recursion:
/// locking twice from the same thread spins forever.
///
/// It implements [`RawMutex`], so it satisfies the lockable contract of `lock_api`
/// and can be used with guards through [`Spinlock`].
pub struct RawSpinlock {
    locked: AtomicBool,
}

impl RawSpinlock {
    /// Creates a new unlocked spinlock.
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Tries to acquire the lock without waiting. Returns whether it succeeded.
    #[inline]
    pub fn try_lock(&self) -> bool {
        !self.locked.swap(true, Ordering::Acquire)
    }

    /// Acquires the lock, busy-spinning for the first `spin_count` failed attempts
    /// and yielding the thread after every further failed attempt.
    #[inline]
    pub fn lock_with(&self, spin_count: usize) {
        if !self.try_lock() {
            self.lock_contended(spin_count);
        }
    }

    #[cold]
    #[inline(never)]
    fn lock_contended(&self, spin_count: usize) {
        let mut attempt = 0;

        loop {
            if attempt == spin_count {
                trace!(spin_count, "spinlock is contended, yielding");
            }

            spin_then_yield(attempt, spin_count);

            attempt += 1;

            // Wait on a plain load so that waiters don't bounce the line between cores.
            if !self.locked.load(Ordering::Relaxed) && self.try_lock() {
                return;
            }
        }
    }

    /// Acquires the lock, calling `policy` with the index of every failed attempt.
    ///
    /// See [`busy_spin`](crate::backoff::busy_spin), [`yield_spin`](crate::backoff::yield_spin)
    /// and [`adaptive_spin`](crate::backoff::adaptive_spin).
    pub fn lock_with_policy(&self, mut policy: impl FnMut(usize)) {
        let mut attempt = 0;

        while !self.try_lock() {
            policy(attempt);

            attempt += 1;
        }
    }

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The lock must be held by the caller.
    #[inline]
    pub unsafe fn unlock(&self) {
        debug_assert!(self.is_locked(), "unlocking a spinlock that isn't locked");

        self.locked.store(false, Ordering::Release);
    }

    /// Returns whether the lock is currently held by anyone.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl Default for RawSpinlock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawSpinlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSpinlock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

unsafe impl RawMutex for RawSpinlock {
    #[allow(
        clippy::declare_interior_mutable_const,
        reason = "It is the way lock_api initializes raw mutexes."
    )]
    const INIT: Self = Self::new();

    type GuardMarker = GuardSend;

    #[inline]
    fn lock(&self) {
        self.lock_with(DEFAULT_SPIN_COUNT);
    }

    #[inline]
    fn try_lock(&self) -> bool {
        Self::try_lock(self)
    }

    #[inline]
    unsafe fn unlock(&self) {
        unsafe { Self::unlock(self) };
    }

    #[inline]
    fn is_locked(&self) -> bool {
        Self::is_locked(self)
    }
}

/// A spinlock protecting a value of type `T`.
pub type Spinlock<T> = lock_api::Mutex<RawSpinlock, T>;

/// A RAII guard of a [`Spinlock`].
pub type SpinlockGuard<'lock, T> = lock_api::MutexGuard<'lock, RawSpinlock, T>;

/// Extends [`Spinlock`] with locking by an explicit spin count.
pub trait SpinlockExt<T> {
    /// Locks, spinning `spin_count` failed attempts before yielding.
    fn lock_spin(&self, spin_count: usize) -> SpinlockGuard<'_, T>;
}

impl<T> SpinlockExt<T> for Spinlock<T> {
    #[inline]
    fn lock_spin(&self, spin_count: usize) -> SpinlockGuard<'_, T> {
        unsafe {
            self.raw().lock_with(spin_count);

            self.make_guard_unchecked()
        }
    }
}
