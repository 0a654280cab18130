use super::MpscQueue;
use crate::consumer::LinkedConsumer;
use crate::hook::{Hook, Linked};
use crate::light_arc::LightArc;
use crate::producer::LinkedProducer;
use core::cell::Cell;
use core::marker::PhantomData;
use std::ptr::NonNull;

/// A producer of a split [`MpscQueue`]. Clone it to get more producers.
pub struct MpscProducer<T> {
    queue: LightArc<MpscQueue<T>>,
}

impl<T: Linked<Hook>> MpscProducer<T> {
    /// Pushes `node` to the tail of the queue.
    ///
    /// # Safety
    ///
    /// The same as for [`MpscQueue::push`].
    #[inline]
    pub unsafe fn push(&self, node: NonNull<T>) {
        unsafe { self.queue.push(node) };
    }
}

impl<T> Clone for MpscProducer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T: Linked<Hook>> LinkedProducer<T> for MpscProducer<T> {
    #[inline]
    unsafe fn push(&self, node: NonNull<T>) {
        unsafe { Self::push(self, node) };
    }
}

/// The only consumer of a split [`MpscQueue`].
///
/// It is `Send` but neither `Sync` nor `Clone`, so popping is safe.
pub struct MpscConsumer<T> {
    queue: LightArc<MpscQueue<T>>,
    _non_sync: PhantomData<Cell<()>>,
}

impl<T: Linked<Hook>> MpscConsumer<T> {
    /// Pops the oldest node, or returns `None` if the queue is empty or a push is in flight.
    #[inline]
    pub fn try_pop(&self) -> Option<NonNull<T>> {
        unsafe { self.queue.try_pop() }
    }

    /// Returns whether the queue has nothing to pop.
    #[inline]
    pub fn is_empty(&self) -> bool {
        unsafe { self.queue.is_empty() }
    }

    /// Returns the queue once every producer is dropped, or gives the consumer back.
    pub fn try_into_inner(self) -> Result<MpscQueue<T>, Self> {
        LightArc::try_unwrap(self.queue).map_err(|queue| Self {
            queue,
            _non_sync: PhantomData,
        })
    }
}

impl<T: Linked<Hook>> LinkedConsumer<T> for MpscConsumer<T> {
    #[inline]
    fn try_pop(&self) -> Option<NonNull<T>> {
        Self::try_pop(self)
    }
}

impl<T: Linked<Hook>> MpscQueue<T> {
    /// Splits the queue into a cloneable producer and the only consumer.
    pub fn split(self) -> (MpscProducer<T>, MpscConsumer<T>) {
        let queue = LightArc::new(self);

        (
            MpscProducer {
                queue: queue.clone(),
            },
            MpscConsumer {
                queue,
                _non_sync: PhantomData,
            },
        )
    }
}
