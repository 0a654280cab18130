//! Provides the [`LinkedConsumer`] and the [`ValueConsumer`] traits.
use std::ptr::NonNull;

/// A consumer of an intrusive queue.
///
/// Single-consumer queues implement it only through their consumer handle,
/// so calling [`try_pop`](Self::try_pop) is always safe.
pub trait LinkedConsumer<T> {
    /// Unlinks the oldest node, or returns `None` if the queue looks empty.
    ///
    /// Some queues may report empty while a push is still in flight; see their docs.
    fn try_pop(&self) -> Option<NonNull<T>>;
}

/// A consumer of a queue that moves values out of queue-owned nodes.
pub trait ValueConsumer<T> {
    /// Moves the oldest value out of the queue, or returns `None` if it is empty.
    fn try_pop(&self) -> Option<T>;
}

impl<T, C: LinkedConsumer<T> + ?Sized> LinkedConsumer<T> for &C {
    #[inline]
    fn try_pop(&self) -> Option<NonNull<T>> {
        (**self).try_pop()
    }
}

impl<T, C: ValueConsumer<T> + ?Sized> ValueConsumer<T> for &C {
    #[inline]
    fn try_pop(&self) -> Option<T> {
        (**self).try_pop()
    }
}
