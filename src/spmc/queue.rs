use crate::backoff::DEFAULT_SPIN_COUNT;
use crate::cache_padded::CachePadded;
use crate::consumer::LinkedConsumer;
use crate::hook::{free_stub, hook_of, new_stub, node_of, Hook, Linked};
use crate::loom_bindings::sync::atomic::AtomicPtr;
use crate::mpsc::{is_drained, link_at_tail, unlink_at_head};
use crate::producer::LinkedProducer;
use crate::spinlock::{Spinlock, SpinlockExt};
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::sync::atomic::Ordering;

/// An intrusive single-producer, multi-consumer unbounded queue.
///
/// It pushes exactly like [`MpscQueue`](crate::MpscQueue) and pops with the same traversal
/// inside a [`Spinlock`] critical section, so any number of threads may call
/// [`try_pop`](Self::try_pop). The lock shares a padded cache line with `head`
/// and never with `tail`, so the producer doesn't contend with the consumers.
///
/// The pop side takes a lock, therefore [`is_lock_free`](Self::is_lock_free) returns `false`.
pub struct SpmcQueue<T> {
    tail: CachePadded<AtomicPtr<Hook>>,
    head: CachePadded<Spinlock<*mut Hook>>,
    stub: NonNull<Hook>,
    spin_count: usize,
    _marker: PhantomData<NonNull<T>>,
}

impl<T: Linked<Hook>> SpmcQueue<T> {
    /// Creates a new empty queue whose consumers spin [`DEFAULT_SPIN_COUNT`]
    /// times before yielding.
    pub fn new() -> Self {
        Self::with_spin_count(DEFAULT_SPIN_COUNT)
    }

    /// Creates a new empty queue whose consumers spin `spin_count` times
    /// on the pop lock before yielding.
    pub fn with_spin_count(spin_count: usize) -> Self {
        let stub = new_stub();

        Self {
            tail: CachePadded::new(AtomicPtr::new(stub.as_ptr())),
            head: CachePadded::new(Spinlock::new(stub.as_ptr())),
            stub,
            spin_count,
            _marker: PhantomData,
        }
    }

    /// Pushes `node` to the tail of the queue.
    ///
    /// # Safety
    ///
    /// `node` must point to a live `T` that stays valid until it is popped,
    /// and its hook must not be linked into any queue.
    #[inline]
    pub unsafe fn push(&self, node: NonNull<T>) {
        unsafe { link_at_tail(&self.tail, hook_of(node)) };
    }

    /// Pops the oldest node, or returns `None` if the queue is empty or a push is in flight.
    #[inline]
    pub fn try_pop(&self) -> Option<NonNull<T>> {
        let mut head = self.head.lock_spin(self.spin_count);

        unsafe { unlink_at_head(&mut head, &self.tail, self.stub).map(|hook| node_of(hook)) }
    }

    /// Returns whether the queue has nothing to pop.
    ///
    /// It doesn't see pushes that are still in flight.
    pub fn is_empty(&self) -> bool {
        let head = self.head.lock_spin(self.spin_count);

        unsafe { is_drained(*head, self.stub) }
    }

    /// Returns the number of failed lock attempts a consumer spins before yielding.
    pub fn spin_count(&self) -> usize {
        self.spin_count
    }

    /// Returns whether both sides of the queue are lock-free.
    pub const fn is_lock_free() -> bool {
        false
    }
}

impl<T: Linked<Hook>> Default for SpmcQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SpmcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpmcQueue")
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .field("spin_count", &self.spin_count)
            .finish_non_exhaustive()
    }
}

impl<T: Linked<Hook>> LinkedProducer<T> for SpmcQueue<T> {
    #[inline]
    unsafe fn push(&self, node: NonNull<T>) {
        unsafe { Self::push(self, node) };
    }
}

impl<T: Linked<Hook>> LinkedConsumer<T> for SpmcQueue<T> {
    #[inline]
    fn try_pop(&self) -> Option<NonNull<T>> {
        Self::try_pop(self)
    }
}

unsafe impl<T: Send> Send for SpmcQueue<T> {}
unsafe impl<T: Send> Sync for SpmcQueue<T> {}

impl<T> Drop for SpmcQueue<T> {
    fn drop(&mut self) {
        unsafe { free_stub(self.stub) };
    }
}
