use crate::cache_padded::CachePadded;
use crate::consumer::LinkedConsumer;
use crate::hints::unlikely;
use crate::hook::{hook_of, node_of, Linked, SeqHook};
use crate::light_arc::LightArc;
use crate::loom_bindings::sync::atomic::{AtomicPtr, AtomicU32};
use crate::producer::LinkedProducer;
use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use std::sync::atomic::Ordering;

struct ProducerSide {
    /// The top of the LIFO stack of pushed nodes.
    tail: AtomicPtr<SeqHook>,
    /// The stamp of the last pushed node.
    seq: AtomicU32,
}

struct ConsumerSide {
    /// The already reversed nodes, oldest first.
    head: *mut SeqHook,
    /// The stamp of the newest node the consumer has taken off the stack.
    last_seq: u32,
}

/// An intrusive single-producer, single-consumer unbounded queue with lazy batch reversal.
///
/// The producer pushes onto a LIFO stack and stamps each node's [`SeqHook`] with a
/// sequence number (`1` for the first push, one more for every next one, wrapping).
/// When the consumer runs out of reversed nodes, it takes every node up to the latest
/// published stamp off the stack at once and reverses them into FIFO order.
/// A push is three plain stores and a pop is usually one pointer read.
///
/// Push order equals pop order exactly, including across reversals.
/// A consumer that falls behind by `u32::MAX` pushes loses track of the stamps.
///
/// Use [`split`](Self::split) to get safe producer and consumer handles.
pub struct SeqQueue<T> {
    producer: CachePadded<ProducerSide>,
    consumer: CachePadded<UnsafeCell<ConsumerSide>>,
    _marker: PhantomData<NonNull<T>>,
}

impl<T: Linked<SeqHook>> SeqQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self {
            producer: CachePadded::new(ProducerSide {
                tail: AtomicPtr::new(ptr::null_mut()),
                seq: AtomicU32::new(0),
            }),
            consumer: CachePadded::new(UnsafeCell::new(ConsumerSide {
                head: ptr::null_mut(),
                last_seq: 0,
            })),
            _marker: PhantomData,
        }
    }

    /// Pushes `node`, stamping its hook with the next sequence number.
    ///
    /// # Safety
    ///
    /// Only one thread may push at a time. `node` must point to a live `T` that stays valid
    /// until it is popped, and its hook must not be linked into any queue.
    #[inline]
    pub unsafe fn push(&self, node: NonNull<T>) {
        let hook = unsafe { hook_of(node) };
        // After a pop the tail may still be this node; the resulting self-link is never
        // followed, because the reversal stops at the oldest stamp.
        let tail = self.producer.tail.load(Ordering::Relaxed);
        let seq = self.producer.seq.load(Ordering::Relaxed).wrapping_add(1);
        let hook_ref = unsafe { hook.as_ref() };

        hook_ref.set_seq(seq);
        hook_ref.set_next(tail);

        self.producer.tail.store(hook.as_ptr(), Ordering::Release);
        self.producer.seq.store(seq, Ordering::Release);
    }

    /// Pops the oldest node, or returns `None` if the queue is empty.
    ///
    /// # Safety
    ///
    /// Only one thread may pop at a time.
    #[inline]
    pub unsafe fn try_pop(&self) -> Option<NonNull<T>> {
        let side = unsafe { &mut *self.consumer.get() };

        if let Some(head) = NonNull::new(side.head) {
            side.head = unsafe { head.as_ref() }.next();

            return Some(unsafe { node_of(head) });
        }

        unsafe { Self::reverse_and_pop(side, &self.producer) }
    }

    /// Takes every node up to the published stamp off the stack, links all of them but
    /// the oldest into `head` in FIFO order and returns the oldest.
    #[inline(never)]
    unsafe fn reverse_and_pop(
        side: &mut ConsumerSide,
        producer: &ProducerSide,
    ) -> Option<NonNull<T>> {
        let seq = producer.seq.load(Ordering::Acquire);

        if seq == side.last_seq {
            return None;
        }

        // The tail may be newer than `seq`, such nodes wait for the next reversal.
        let mut node = producer.tail.load(Ordering::Acquire);

        while unsafe { (*node).seq() } != seq {
            node = unsafe { (*node).next() };

            debug_assert!(!node.is_null(), "the node stamped {seq} is not on the stack");
        }

        let oldest = side.last_seq.wrapping_add(1);
        let mut reversed = ptr::null_mut();

        loop {
            let hook = unsafe { &*node };

            if unlikely(hook.seq() == oldest) {
                side.head = reversed;
                side.last_seq = seq;

                return Some(unsafe { node_of(NonNull::from(hook)) });
            }

            let older = hook.next();

            hook.set_next(reversed);
            reversed = node;
            node = older;
        }
    }

    /// Returns whether the queue is empty.
    ///
    /// # Safety
    ///
    /// Only the thread that pops may call it.
    #[inline]
    pub unsafe fn is_empty(&self) -> bool {
        let side = unsafe { &*self.consumer.get() };

        side.head.is_null() && self.producer.seq.load(Ordering::Acquire) == side.last_seq
    }

    /// Splits the queue into its producer and its consumer.
    pub fn split(self) -> (SeqProducer<T>, SeqConsumer<T>) {
        let queue = LightArc::new(self);

        (
            SeqProducer {
                queue: queue.clone(),
                _non_sync: PhantomData,
            },
            SeqConsumer {
                queue,
                _non_sync: PhantomData,
            },
        )
    }
}

impl<T: Linked<SeqHook>> Default for SeqQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SeqQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqQueue")
            .field("tail", &self.producer.tail.load(Ordering::Relaxed))
            .field("seq", &self.producer.seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

unsafe impl<T: Send> Send for SeqQueue<T> {}
unsafe impl<T: Send> Sync for SeqQueue<T> {}

/// The producer of a split [`SeqQueue`].
pub struct SeqProducer<T> {
    queue: LightArc<SeqQueue<T>>,
    _non_sync: PhantomData<Cell<()>>,
}

impl<T: Linked<SeqHook>> SeqProducer<T> {
    /// Pushes `node`, stamping its hook with the next sequence number.
    ///
    /// # Safety
    ///
    /// `node` must point to a live `T` that stays valid until it is popped,
    /// and its hook must not be linked into any queue.
    #[inline]
    pub unsafe fn push(&self, node: NonNull<T>) {
        unsafe { self.queue.push(node) };
    }
}

impl<T: Linked<SeqHook>> LinkedProducer<T> for SeqProducer<T> {
    #[inline]
    unsafe fn push(&self, node: NonNull<T>) {
        unsafe { Self::push(self, node) };
    }
}

/// The consumer of a split [`SeqQueue`].
pub struct SeqConsumer<T> {
    queue: LightArc<SeqQueue<T>>,
    _non_sync: PhantomData<Cell<()>>,
}

impl<T: Linked<SeqHook>> SeqConsumer<T> {
    /// Pops the oldest node, or returns `None` if the queue is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<NonNull<T>> {
        unsafe { self.queue.try_pop() }
    }

    /// Returns whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        unsafe { self.queue.is_empty() }
    }

    /// Returns the queue once the producer is dropped, or gives the consumer back.
    pub fn try_into_inner(self) -> Result<SeqQueue<T>, Self> {
        LightArc::try_unwrap(self.queue).map_err(|queue| Self {
            queue,
            _non_sync: PhantomData,
        })
    }
}

impl<T: Linked<SeqHook>> LinkedConsumer<T> for SeqConsumer<T> {
    #[inline]
    fn try_pop(&self) -> Option<NonNull<T>> {
        Self::try_pop(self)
    }
}
