use crate::backoff::DEFAULT_SPIN_COUNT;
use crate::cache_padded::CachePadded;
use crate::consumer::LinkedConsumer;
use crate::hook::{Hook, Linked};
use crate::mpsc::MpscQueue;
use crate::producer::LinkedProducer;
use crate::spinlock::{Spinlock, SpinlockExt};
use core::fmt;
use core::ptr::NonNull;

/// An intrusive multi-producer, multi-consumer unbounded queue.
///
/// It is an [`MpscQueue`] whose single-consumer side is serialized by a [`Spinlock`].
/// Producers never take the lock.
///
/// # Examples
///
/// ```
/// use hookq::{impl_linked, Hook, MpmcQueue};
/// use std::ptr::NonNull;
/// use std::thread;
///
/// struct Task {
///     hook: Hook,
///     id: usize,
/// }
///
/// impl_linked!(Task, hook: Hook);
///
/// let tasks: Vec<Task> = (0..8).map(|id| Task { hook: Hook::new(), id }).collect();
/// let queue = MpmcQueue::new();
/// let queue = &queue;
///
/// thread::scope(|s| {
///     for half in tasks.chunks(4) {
///         s.spawn(move || {
///             for task in half {
///                 unsafe { queue.push(NonNull::from(task)) };
///             }
///         });
///     }
/// });
///
/// let mut ids: Vec<_> = std::iter::from_fn(|| queue.try_pop())
///     .map(|task| unsafe { task.as_ref() }.id)
///     .collect();
///
/// ids.sort_unstable();
///
/// assert_eq!(ids, (0..8).collect::<Vec<_>>());
/// ```
pub struct MpmcQueue<T> {
    pop_lock: CachePadded<Spinlock<()>>,
    queue: MpscQueue<T>,
    spin_count: usize,
}

impl<T: Linked<Hook>> MpmcQueue<T> {
    /// Creates a new empty queue whose consumers spin [`DEFAULT_SPIN_COUNT`]
    /// times before yielding.
    pub fn new() -> Self {
        Self::with_spin_count(DEFAULT_SPIN_COUNT)
    }

    /// Creates a new empty queue whose consumers spin `spin_count` times
    /// on the pop lock before yielding.
    pub fn with_spin_count(spin_count: usize) -> Self {
        Self {
            pop_lock: CachePadded::new(Spinlock::new(())),
            queue: MpscQueue::new(),
            spin_count,
        }
    }

    /// Pushes `node` to the tail of the queue without taking the lock.
    ///
    /// # Safety
    ///
    /// The same as for [`MpscQueue::push`].
    #[inline]
    pub unsafe fn push(&self, node: NonNull<T>) {
        unsafe { self.queue.push(node) };
    }

    /// Pops the oldest node, or returns `None` if the queue is empty or a push is in flight.
    #[inline]
    pub fn try_pop(&self) -> Option<NonNull<T>> {
        let _guard = self.pop_lock.lock_spin(self.spin_count);

        unsafe { self.queue.try_pop() }
    }

    /// Returns whether the queue has nothing to pop.
    ///
    /// It doesn't see pushes that are still in flight.
    pub fn is_empty(&self) -> bool {
        let _guard = self.pop_lock.lock_spin(self.spin_count);

        unsafe { self.queue.is_empty() }
    }

    /// Returns the number of failed lock attempts a consumer spins before yielding.
    pub fn spin_count(&self) -> usize {
        self.spin_count
    }

    /// Returns whether both sides of the queue are lock-free.
    pub const fn is_lock_free() -> bool {
        false
    }

    /// Returns the inner single-consumer queue.
    pub fn into_inner(self) -> MpscQueue<T> {
        self.queue
    }
}

impl<T: Linked<Hook>> Default for MpmcQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked<Hook>> From<MpscQueue<T>> for MpmcQueue<T> {
    fn from(queue: MpscQueue<T>) -> Self {
        Self {
            pop_lock: CachePadded::new(Spinlock::new(())),
            queue,
            spin_count: DEFAULT_SPIN_COUNT,
        }
    }
}

impl<T> fmt::Debug for MpmcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpmcQueue")
            .field("queue", &self.queue)
            .field("spin_count", &self.spin_count)
            .finish_non_exhaustive()
    }
}

impl<T: Linked<Hook>> LinkedProducer<T> for MpmcQueue<T> {
    #[inline]
    unsafe fn push(&self, node: NonNull<T>) {
        unsafe { Self::push(self, node) };
    }
}

impl<T: Linked<Hook>> LinkedConsumer<T> for MpmcQueue<T> {
    #[inline]
    fn try_pop(&self) -> Option<NonNull<T>> {
        Self::try_pop(self)
    }
}
