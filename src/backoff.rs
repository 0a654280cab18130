//! This module provides a [`Backoff`] that busy-spins for a bounded number of
//! attempts and then yields the thread on every further attempt,
//! and the spin policies accepted by
//! [`RawSpinlock::lock_with_policy`](crate::RawSpinlock::lock_with_policy).
use crate::loom_bindings::{hint, thread};
use core::cell::Cell;
use core::fmt;
use std::time::Duration;

/// The number of busy spins [`Backoff::new`] and [`RawSpinlock::lock`](crate::RawSpinlock)
/// perform before they start to yield.
pub const DEFAULT_SPIN_COUNT: usize = 100;

/// Spin-then-yield backoff for retry loops.
///
/// The first `spin_count` calls to [`snooze`](Backoff::snooze) execute a single
/// *PAUSE*/*YIELD* CPU hint each; every following call gives up the remaining
/// timeslice to the OS scheduler. It never blocks and never times out.
///
/// Queues in this crate never retry internally;
/// this is the tool for callers that want to wait for a transient empty to resolve.
///
/// # Examples
///
/// Waiting for an item from another thread:
///
/// ```
/// use hookq::{Backoff, ConcurrentQueue};
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(ConcurrentQueue::new());
/// let producer = queue.clone();
///
/// # let t =
/// thread::spawn(move || producer.push(42).unwrap());
///
/// let backoff = Backoff::new();
/// let value = loop {
///     if let Some(value) = queue.try_pop() {
///         break value;
///     }
///
///     backoff.snooze();
/// };
///
/// assert_eq!(value, 42);
/// # t.join().unwrap();
/// ```
pub struct Backoff {
    attempt: Cell<usize>,
    spin_count: usize,
}

impl Backoff {
    /// Creates a new `Backoff` that spins [`DEFAULT_SPIN_COUNT`] times before yielding.
    #[inline]
    pub const fn new() -> Self {
        Self::with_spin_count(DEFAULT_SPIN_COUNT)
    }

    /// Creates a new `Backoff` that spins `spin_count` times before yielding.
    #[inline]
    pub const fn with_spin_count(spin_count: usize) -> Self {
        Self {
            attempt: Cell::new(0),
            spin_count,
        }
    }

    /// Resets the backoff state.
    #[inline]
    pub fn reset(&self) {
        self.attempt.set(0);
    }

    /// Backs off once: spins while under the spin count, yields afterwards.
    #[inline]
    pub fn snooze(&self) {
        let attempt = self.attempt.get();

        spin_then_yield(attempt, self.spin_count);

        self.attempt.set(attempt.saturating_add(1));
    }

    /// Returns `true` once the spin phase is over and every snooze yields.
    #[inline]
    pub fn is_yielding(&self) -> bool {
        self.attempt.get() >= self.spin_count
    }

    /// Returns the number of snoozes since creation or the last [`reset`](Backoff::reset).
    #[inline]
    pub fn attempts(&self) -> usize {
        self.attempt.get()
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("attempt", &self.attempt)
            .field("spin_count", &self.spin_count)
            .field("is_yielding", &self.is_yielding())
            .finish()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Spins on the first `spin_count` attempts, yields on the others.
#[inline]
pub(crate) fn spin_then_yield(attempt: usize, spin_count: usize) {
    if attempt < spin_count {
        hint::spin_loop();
    } else {
        thread::yield_now();
    }
}

/// Busy-spinning policy: only a CPU spin hint, never leaves the core.
#[inline]
pub fn busy_spin(attempt: usize) {
    let _ = attempt;

    hint::spin_loop();
}

/// Yielding policy: gives up the remaining timeslice on every failed attempt.
#[inline]
pub fn yield_spin(attempt: usize) {
    let _ = attempt;

    thread::yield_now();
}

/// Adaptive policy with three phases:
///
/// * `attempt <= BUSY_SPIN_COUNT`: busy spin;
/// * `attempt > BUSY_SPIN_COUNT`: yield the remaining timeslice;
/// * `attempt > 2 * BUSY_SPIN_COUNT`: sleep `attempt` microseconds, at most 1 ms,
///   letting the OS suspend the core.
#[inline]
pub fn adaptive_spin<const BUSY_SPIN_COUNT: usize>(attempt: usize) {
    if attempt > 2 * BUSY_SPIN_COUNT {
        let micros = u64::try_from(attempt).map_or(1000, |attempt| attempt.min(1000));

        thread::sleep(Duration::from_micros(micros));
    } else if attempt > BUSY_SPIN_COUNT {
        thread::yield_now();
    } else {
        hint::spin_loop();
    }
}
