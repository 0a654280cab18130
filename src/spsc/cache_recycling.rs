use crate::cache_padded::CachePadded;
use crate::consumer::ValueConsumer;
use crate::error::AllocError;
use crate::hints::{likely, unlikely};
use crate::light_arc::LightArc;
use crate::loom_bindings::sync::atomic::AtomicPtr;
use crate::producer::ValueProducer;
use crate::trace::debug;
use crate::value_node::ValueNode as Node;
use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::marker::PhantomData;
use core::mem::needs_drop;
use core::ptr;
use std::sync::atomic::Ordering;

/// The cursors only the producer touches.
struct ProducerSide<T> {
    /// The last pushed node.
    tail: *mut Node<T>,
    /// The oldest node of the pool, reused first.
    cache_tail: *mut Node<T>,
    /// The last `head` the producer has seen. Nodes before it are free.
    head_copy: *mut Node<T>,
    /// All nodes ever allocated, the sentinel included.
    nodes: usize,
}

/// An unbounded single-producer, single-consumer queue of values that recycles its nodes.
///
/// Values are moved into heap nodes. Nodes that the consumer has passed are not freed:
/// the producer reuses them, so after a warm-up a push allocates nothing.
/// The pool only grows; it is freed when the queue is dropped.
///
/// The producer and the consumer synchronize through one pointer hand-off each way:
/// a push publishes its node by a release store of the previous node's link,
/// a pop publishes the free nodes by a release store of `head`.
///
/// Use [`split`](Self::split) to get safe producer and consumer handles.
///
/// # Examples
///
/// ```
/// use hookq::spsc::SpscQueue;
/// use std::thread;
///
/// let (producer, consumer) = SpscQueue::with_capacity(16)?.split();
///
/// let t = thread::spawn(move || {
///     for i in 0..100 {
///         producer.push(i).unwrap();
///     }
/// });
///
/// let mut expected = 0;
///
/// while expected < 100 {
///     if let Some(value) = consumer.try_pop() {
///         assert_eq!(value, expected);
///         expected += 1;
///     }
/// }
///
/// t.join().unwrap();
/// # Ok::<(), hookq::AllocError>(())
/// ```
pub struct SpscQueue<T> {
    head: CachePadded<AtomicPtr<Node<T>>>,
    producer: CachePadded<UnsafeCell<ProducerSide<T>>>,
}

impl<T> SpscQueue<T> {
    /// Creates a new empty queue with only the sentinel node.
    ///
    /// # Panics
    ///
    /// It calls [`handle_alloc_error`](std::alloc::handle_alloc_error)
    /// if the sentinel can't be allocated.
    pub fn new() -> Self {
        let sentinel = Node::<T>::allocate_sentinel().as_ptr();

        Self {
            head: CachePadded::new(AtomicPtr::new(sentinel)),
            producer: CachePadded::new(UnsafeCell::new(ProducerSide {
                tail: sentinel,
                cache_tail: sentinel,
                head_copy: sentinel,
                nodes: 1,
            })),
        }
    }

    /// Creates a new empty queue whose pool already holds `capacity` free nodes,
    /// so the first `capacity` pushes don't allocate.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let mut queue = Self::new();
        let side = queue.producer.get_mut();

        for _ in 0..capacity {
            let node = Node::<T>::allocate()?.as_ptr();

            // Free nodes live before `head_copy`, so new ones go in front of the pool.
            unsafe { (*node).next.store(side.cache_tail, Ordering::Relaxed) };

            side.cache_tail = node;
            side.nodes += 1;
        }

        Ok(queue)
    }

    /// Returns a node for a push: the oldest free one, or a newly allocated one.
    #[inline]
    fn alloc_node(
        side: &mut ProducerSide<T>,
        head: &AtomicPtr<Node<T>>,
    ) -> Result<*mut Node<T>, AllocError> {
        if likely(side.cache_tail != side.head_copy) {
            return Ok(Self::take_cached(side));
        }

        side.head_copy = head.load(Ordering::Acquire);

        if side.cache_tail != side.head_copy {
            return Ok(Self::take_cached(side));
        }

        let node = Node::allocate()?;

        side.nodes += 1;

        debug!(nodes = side.nodes, "SPSC queue node pool grows");

        Ok(node.as_ptr())
    }

    #[inline(always)]
    fn take_cached(side: &mut ProducerSide<T>) -> *mut Node<T> {
        let node = side.cache_tail;

        side.cache_tail = unsafe { (*node).next.load(Ordering::Relaxed) };

        node
    }

    /// Moves `value` into the queue.
    ///
    /// It fails only if a new node is needed and can't be allocated; the value is dropped then.
    ///
    /// # Safety
    ///
    /// Only one thread may push at a time.
    #[inline]
    pub unsafe fn push(&self, value: T) -> Result<(), AllocError> {
        let side = unsafe { &mut *self.producer.get() };
        let node = Self::alloc_node(side, &self.head)?;

        unsafe {
            (*node).next.store(ptr::null_mut(), Ordering::Relaxed);
            Node::put_value(node, value);
            (*side.tail).next.store(node, Ordering::Release);
        }

        side.tail = node;

        Ok(())
    }

    /// Moves the oldest value out of the queue, or returns `None` if it is empty.
    ///
    /// # Safety
    ///
    /// Only one thread may pop at a time.
    #[inline]
    pub unsafe fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = unsafe { (*head).next.load(Ordering::Acquire) };

        if unlikely(next.is_null()) {
            return None;
        }

        let value = unsafe { Node::take_value(next) };

        // `next` becomes the sentinel, `head` goes back to the producer's pool.
        self.head.store(next, Ordering::Release);

        Some(value)
    }

    /// Returns whether the queue is empty.
    ///
    /// # Safety
    ///
    /// Only the thread that pops may call it.
    #[inline]
    pub unsafe fn is_empty(&self) -> bool {
        let head = self.head.load(Ordering::Relaxed);

        unsafe { (*head).next.load(Ordering::Acquire) }.is_null()
    }

    /// Returns the number of nodes the queue owns, the sentinel included.
    pub fn cached_nodes(&mut self) -> usize {
        self.producer.get_mut().nodes
    }

    /// Splits the queue into its producer and its consumer.
    pub fn split(self) -> (SpscProducer<T>, SpscConsumer<T>) {
        let queue = LightArc::new(self);

        (
            SpscProducer {
                queue: queue.clone(),
                _non_sync: PhantomData,
            },
            SpscConsumer {
                queue,
                _non_sync: PhantomData,
            },
        )
    }
}

impl<T> Default for SpscQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SpscQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscQueue")
            .field("head", &self.head.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T> Drop for SpscQueue<T> {
    fn drop(&mut self) {
        let head = self.head.load(Ordering::Relaxed);
        let side = self.producer.get_mut();

        unsafe {
            if needs_drop::<T>() {
                let mut live = (*head).next.load(Ordering::Relaxed);

                while !live.is_null() {
                    (*(*live).value.get()).assume_init_drop();

                    live = (*live).next.load(Ordering::Relaxed);
                }
            }

            // The pool, the sentinel and the live nodes form one chain.
            let mut node = side.cache_tail;

            while !node.is_null() {
                let next = (*node).next.load(Ordering::Relaxed);

                Node::free(node);

                node = next;
            }
        }
    }
}

/// The producer of a split [`SpscQueue`].
pub struct SpscProducer<T> {
    queue: LightArc<SpscQueue<T>>,
    _non_sync: PhantomData<Cell<()>>,
}

impl<T> SpscProducer<T> {
    /// Moves `value` into the queue.
    ///
    /// It fails only if a new node is needed and can't be allocated; the value is dropped then.
    #[inline]
    pub fn push(&self, value: T) -> Result<(), AllocError> {
        unsafe { self.queue.push(value) }
    }

    /// Returns the number of nodes the queue owns, the sentinel included.
    pub fn cached_nodes(&self) -> usize {
        unsafe { (*self.queue.producer.get()).nodes }
    }
}

impl<T> ValueProducer<T> for SpscProducer<T> {
    #[inline]
    fn push(&self, value: T) -> Result<(), AllocError> {
        Self::push(self, value)
    }
}

/// The consumer of a split [`SpscQueue`].
pub struct SpscConsumer<T> {
    queue: LightArc<SpscQueue<T>>,
    _non_sync: PhantomData<Cell<()>>,
}

impl<T> SpscConsumer<T> {
    /// Moves the oldest value out of the queue, or returns `None` if it is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        unsafe { self.queue.try_pop() }
    }

    /// Returns whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        unsafe { self.queue.is_empty() }
    }

    /// Returns the queue once the producer is dropped, or gives the consumer back.
    pub fn try_into_inner(self) -> Result<SpscQueue<T>, Self> {
        LightArc::try_unwrap(self.queue).map_err(|queue| Self {
            queue,
            _non_sync: PhantomData,
        })
    }
}

impl<T> ValueConsumer<T> for SpscConsumer<T> {
    #[inline]
    fn try_pop(&self) -> Option<T> {
        Self::try_pop(self)
    }
}
