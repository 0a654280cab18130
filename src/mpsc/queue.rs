use crate::cache_padded::CachePadded;
use crate::hints::{likely, unlikely};
use crate::hook::{free_stub, hook_of, new_stub, node_of, Hook, Linked};
use crate::loom_bindings::sync::atomic::AtomicPtr;
use crate::trace::trace;
use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use std::sync::atomic::Ordering;

/// Links `hook` after the current tail and makes it the new tail.
///
/// Between the swap and the link store the chain is broken: the consumer can reach
/// the old tail but not `hook` yet.
///
/// # Safety
///
/// `hook` must be valid and not linked into any queue. `tail` must point to a live hook.
#[inline]
pub(crate) unsafe fn link_at_tail(tail: &AtomicPtr<Hook>, hook: NonNull<Hook>) {
    unsafe { hook.as_ref() }.set_next(ptr::null_mut(), Ordering::Relaxed);

    let prev = tail.swap(hook.as_ptr(), Ordering::AcqRel);

    debug_assert_ne!(prev, hook.as_ptr(), "the same node is pushed twice in a row");

    unsafe { (*prev).set_next(hook.as_ptr(), Ordering::Release) };
}

/// Unlinks the oldest hook, skipping and re-inserting `stub` as needed.
///
/// # Safety
///
/// Only one thread may call it at a time for the same `head`,
/// and `head`, `tail` and `stub` must belong to the same queue.
#[inline]
pub(crate) unsafe fn unlink_at_head(
    head: &mut *mut Hook,
    tail: &AtomicPtr<Hook>,
    stub: NonNull<Hook>,
) -> Option<NonNull<Hook>> {
    let mut first = *head;
    let mut next = unsafe { (*first).next(Ordering::Acquire) };

    if first == stub.as_ptr() {
        if next.is_null() {
            return None;
        }

        *head = next;
        first = next;
        next = unsafe { (*next).next(Ordering::Acquire) };
    }

    if likely(!next.is_null()) {
        *head = next;

        return NonNull::new(first);
    }

    if unlikely(first != tail.load(Ordering::Acquire)) {
        trace!("a push is in flight, reporting the queue as empty");

        return None;
    }

    unsafe { link_at_tail(tail, stub) };

    next = unsafe { (*first).next(Ordering::Acquire) };

    if !next.is_null() {
        *head = next;

        return NonNull::new(first);
    }

    None
}

/// Returns whether no node can be popped right now.
///
/// # Safety
///
/// The caller must have the consumer side of the queue.
#[inline]
pub(crate) unsafe fn is_drained(head: *mut Hook, stub: NonNull<Hook>) -> bool {
    head == stub.as_ptr() && unsafe { stub.as_ref() }.next(Ordering::Acquire).is_null()
}

/// An intrusive multi-producer, single-consumer unbounded queue.
///
/// Nodes are caller-owned values that embed a [`Hook`] (see [`Linked`]).
/// The queue never allocates for them, never frees them
/// and touches only their hook while they are enqueued.
///
/// # Guarantees
///
/// * [`push`](Self::push) is lock-free: one `swap` and one store.
/// * [`try_pop`](Self::try_pop) is wait-free.
/// * The consumer sees the nodes in the order of the producers' tail swaps,
///   so the order of every single producer is preserved.
/// * `try_pop` may return `None` while a push is in flight (the producer has swapped
///   the tail but has not linked its node yet), even though older nodes were pushed
///   before that push started. It never returns a node that isn't there.
///
/// Use [`split`](Self::split) to get a safe consumer handle.
///
/// # Moving
///
/// The queue is movable: its stub lives on the heap. `core::mem::take` moves every
/// enqueued node to the returned queue and leaves an empty one behind.
pub struct MpscQueue<T> {
    tail: CachePadded<AtomicPtr<Hook>>,
    head: CachePadded<UnsafeCell<*mut Hook>>,
    stub: NonNull<Hook>,
    _marker: PhantomData<NonNull<T>>,
}

impl<T: Linked<Hook>> MpscQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        let stub = new_stub();

        Self {
            tail: CachePadded::new(AtomicPtr::new(stub.as_ptr())),
            head: CachePadded::new(UnsafeCell::new(stub.as_ptr())),
            stub,
            _marker: PhantomData,
        }
    }

    /// Pushes `node` to the tail of the queue. Any number of threads may push at once.
    ///
    /// The hook of `node` is cleared before it is linked.
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
    ///
    /// # Safety
    ///
    /// Only one thread may pop at a time.
    #[inline]
    pub unsafe fn try_pop(&self) -> Option<NonNull<T>> {
        let head = unsafe { &mut *self.head.get() };

        unsafe { unlink_at_head(head, &self.tail, self.stub).map(|hook| node_of(hook)) }
    }

    /// Returns whether the queue has nothing to pop.
    ///
    /// It doesn't see pushes that are still in flight.
    ///
    /// # Safety
    ///
    /// Only the thread that pops may call it.
    #[inline]
    pub unsafe fn is_empty(&self) -> bool {
        unsafe { is_drained(*self.head.get(), self.stub) }
    }

    /// Returns whether both sides of the queue are lock-free.
    pub const fn is_lock_free() -> bool {
        true
    }
}

impl<T: Linked<Hook>> Default for MpscQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MpscQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpscQueue")
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .field("stub", &self.stub)
            .finish_non_exhaustive()
    }
}

unsafe impl<T: Send> Send for MpscQueue<T> {}
unsafe impl<T: Send> Sync for MpscQueue<T> {}

impl<T> Drop for MpscQueue<T> {
    fn drop(&mut self) {
        // Enqueued nodes belong to the caller, only the stub is ours.
        unsafe { free_stub(self.stub) };
    }
}
