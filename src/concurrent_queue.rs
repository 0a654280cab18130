//! This module provides the [`ConcurrentQueue`].
use crate::backoff::DEFAULT_SPIN_COUNT;
use crate::cache_padded::CachePadded;
use crate::consumer::ValueConsumer;
use crate::error::AllocError;
use crate::producer::ValueProducer;
use crate::spinlock::{Spinlock, SpinlockExt};
use crate::value_node::ValueNode;
use core::fmt;
use core::marker::PhantomData;
use core::mem::needs_drop;
use core::ptr::NonNull;
use std::sync::atomic::Ordering;

/// An unbounded multi-producer, multi-consumer queue of values with one lock per end.
///
/// Every value is moved into its own heap node. Producers serialize on the tail lock,
/// consumers on the head lock, and the two locks live on separate cache lines,
/// so a push and a pop never wait for each other.
///
/// The head node is always a sentinel whose value is already taken.
/// A pop moves the value out of the node after it, makes that node the sentinel
/// and frees the old one after releasing the lock.
///
/// # Examples
///
/// ```
/// use hookq::ConcurrentQueue;
///
/// let queue = ConcurrentQueue::with_spin_count(16);
///
/// queue.push("first")?;
/// queue.push("second")?;
///
/// assert_eq!(queue.try_pop(), Some("first"));
/// assert_eq!(queue.try_pop(), Some("second"));
/// assert_eq!(queue.try_pop(), None);
/// # Ok::<(), hookq::AllocError>(())
/// ```
pub struct ConcurrentQueue<T> {
    head: CachePadded<Spinlock<NonNull<ValueNode<T>>>>,
    tail: CachePadded<Spinlock<NonNull<ValueNode<T>>>>,
    spin_count: usize,
    _marker: PhantomData<T>,
}

impl<T> ConcurrentQueue<T> {
    /// Creates a new empty queue whose locks spin [`DEFAULT_SPIN_COUNT`] times before yielding.
    ///
    /// # Panics
    ///
    /// It calls [`handle_alloc_error`](std::alloc::handle_alloc_error)
    /// if the sentinel can't be allocated.
    pub fn new() -> Self {
        Self::with_spin_count(DEFAULT_SPIN_COUNT)
    }

    /// Creates a new empty queue whose locks spin `spin_count` times before yielding.
    ///
    /// # Panics
    ///
    /// It calls [`handle_alloc_error`](std::alloc::handle_alloc_error)
    /// if the sentinel can't be allocated.
    pub fn with_spin_count(spin_count: usize) -> Self {
        let sentinel = ValueNode::allocate_sentinel();

        Self {
            head: CachePadded::new(Spinlock::new(sentinel)),
            tail: CachePadded::new(Spinlock::new(sentinel)),
            spin_count,
            _marker: PhantomData,
        }
    }

    /// Moves `value` into the queue.
    ///
    /// The node is allocated before the lock is taken.
    /// It fails only if the node can't be allocated; the value is dropped then.
    #[inline]
    pub fn push(&self, value: T) -> Result<(), AllocError> {
        let node = ValueNode::allocate()?;

        unsafe { ValueNode::put_value(node.as_ptr(), value) };

        let mut tail = self.tail.lock_spin(self.spin_count);

        unsafe { tail.as_ref() }
            .next
            .store(node.as_ptr(), Ordering::Release);

        *tail = node;

        Ok(())
    }

    /// Moves the oldest value out of the queue, or returns `None` if it is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        let mut head = self.head.lock_spin(self.spin_count);
        let sentinel = *head;
        let next = NonNull::new(unsafe { sentinel.as_ref() }.next.load(Ordering::Acquire))?;
        let value = unsafe { ValueNode::take_value(next.as_ptr()) };

        *head = next;

        drop(head);

        // A producer never touches a node after linking its successor.
        unsafe { ValueNode::free(sentinel.as_ptr()) };

        Some(value)
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        let head = self.head.lock_spin(self.spin_count);

        unsafe { head.as_ref() }
            .next
            .load(Ordering::Acquire)
            .is_null()
    }

    /// Returns the number of failed lock attempts spun before yielding.
    pub fn spin_count(&self) -> usize {
        self.spin_count
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentQueue")
            .field("spin_count", &self.spin_count)
            .finish_non_exhaustive()
    }
}

impl<T> ValueProducer<T> for ConcurrentQueue<T> {
    #[inline]
    fn push(&self, value: T) -> Result<(), AllocError> {
        Self::push(self, value)
    }
}

impl<T> ValueConsumer<T> for ConcurrentQueue<T> {
    #[inline]
    fn try_pop(&self) -> Option<T> {
        Self::try_pop(self)
    }
}

unsafe impl<T: Send> Send for ConcurrentQueue<T> {}
unsafe impl<T: Send> Sync for ConcurrentQueue<T> {}

impl<T> Drop for ConcurrentQueue<T> {
    fn drop(&mut self) {
        let sentinel = *self.head.get_mut();
        let mut node = unsafe { sentinel.as_ref() }.next.load(Ordering::Relaxed);

        unsafe { ValueNode::free(sentinel.as_ptr()) };

        while !node.is_null() {
            let next = unsafe { (*node).next.load(Ordering::Relaxed) };

            unsafe {
                if needs_drop::<T>() {
                    drop(ValueNode::take_value(node));
                }

                ValueNode::free(node);
            }

            node = next;
        }
    }
}

#[cfg(all(test, not(hookq_loom)))]
mod tests {
    use super::*;
    use crate::backoff::Backoff;
    use crate::test_lock::TEST_LOCK;
    use std::mem;
    use std::sync::Arc;
    use std::thread;

    const N: usize = 100_000;

    #[test]
    fn test_concurrent_queue() {
        let queue = ConcurrentQueue::new();

        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);

        for i in 0..N {
            queue.push(i).unwrap();
        }

        assert!(!queue.is_empty());

        for i in 0..N {
            assert_eq!(queue.try_pop(), Some(i));
        }

        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_concurrent_queue_drops_remaining_values() {
        let value = Arc::new(());

        {
            let queue = ConcurrentQueue::with_spin_count(0);

            for _ in 0..10 {
                queue.push(value.clone()).unwrap();
            }

            for _ in 0..3 {
                drop(queue.try_pop());
            }

            assert_eq!(Arc::strong_count(&value), 8);
        }

        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    fn test_concurrent_queue_take() {
        let mut queue = ConcurrentQueue::new();

        queue.push(1).unwrap();
        queue.push(2).unwrap();

        let taken = mem::take(&mut queue);

        assert_eq!(queue.try_pop(), None);
        assert_eq!(taken.try_pop(), Some(1));
        assert_eq!(taken.try_pop(), Some(2));
        assert_eq!(taken.spin_count(), DEFAULT_SPIN_COUNT);
    }

    #[test]
    fn test_concurrent_queue_multi_threaded() {
        const PAR: usize = 3;

        let test_guard = TEST_LOCK.lock();

        let queue = Arc::new(ConcurrentQueue::new());
        let mut handles = Vec::new();

        for producer in 0..PAR {
            let queue = queue.clone();

            handles.push(thread::spawn(move || {
                for i in 0..N {
                    queue.push((producer, i)).unwrap();
                }

                Vec::new()
            }));
        }

        for _ in 0..PAR {
            let queue = queue.clone();

            handles.push(thread::spawn(move || {
                let backoff = Backoff::new();
                let mut seen = Vec::with_capacity(N);

                while seen.len() < N {
                    if let Some(item) = queue.try_pop() {
                        seen.push(item);
                        backoff.reset();
                    } else {
                        backoff.snooze();
                    }
                }

                seen
            }));
        }

        let mut counts = vec![vec![0_u8; N]; PAR];

        for handle in handles {
            let seen = handle.join().unwrap();
            let mut last = [None; PAR];

            for (producer, i) in seen {
                assert!(last[producer] < Some(i));

                last[producer] = Some(i);
                counts[producer][i] += 1;
            }
        }

        assert!(counts.iter().flatten().all(|count| *count == 1));
        assert!(queue.is_empty());

        drop(test_guard);
    }
}
