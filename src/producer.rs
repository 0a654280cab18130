//! Provides the [`LinkedProducer`] and the [`ValueProducer`] traits.
use crate::error::AllocError;
use std::ptr::NonNull;

/// A producer of an intrusive queue.
///
/// It is implemented by the producer handles of the split queues and by the queues whose
/// push side is shared by any number of threads.
pub trait LinkedProducer<T> {
    /// Links `node` at the tail of the queue. It never fails and never allocates.
    ///
    /// # Safety
    ///
    /// `node` must point to a live `T` that stays valid and is not pushed anywhere else
    /// through the same hook until it is popped from this queue.
    unsafe fn push(&self, node: NonNull<T>);
}

/// A producer of a queue that moves values into queue-owned nodes.
pub trait ValueProducer<T> {
    /// Moves `value` into the queue.
    ///
    /// It fails only when a node can't be allocated; the value is dropped then.
    fn push(&self, value: T) -> Result<(), AllocError>;
}

impl<T, P: LinkedProducer<T> + ?Sized> LinkedProducer<T> for &P {
    #[inline]
    unsafe fn push(&self, node: NonNull<T>) {
        unsafe { (**self).push(node) };
    }
}

impl<T, P: ValueProducer<T> + ?Sized> ValueProducer<T> for &P {
    #[inline]
    fn push(&self, value: T) -> Result<(), AllocError> {
        (**self).push(value)
    }
}
