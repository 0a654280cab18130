//! This module provides [`LightArc`], the shared owner behind the split producer and
//! consumer handles.
use crate::hints::unlikely;
use crate::loom_bindings::sync::atomic::{fence, AtomicUsize};
use std::ptr::NonNull;
use std::sync::atomic::Ordering;

struct LightArcInner<T> {
    ref_count: AtomicUsize,
    value: T,
}

/// A reference-counted pointer with only a strong count.
///
/// The handles of a split queue never need weak references, so each handle costs one word
/// and one counter update on clone and drop.
pub(crate) struct LightArc<T> {
    inner: NonNull<LightArcInner<T>>,
}

impl<T> LightArc<T> {
    /// Moves `value` to the heap with a reference count of one.
    pub(crate) fn new(value: T) -> Self {
        let inner = Box::new(LightArcInner {
            ref_count: AtomicUsize::new(1),
            value,
        });

        Self {
            inner: NonNull::from(Box::leak(inner)),
        }
    }

    fn inner(&self) -> &LightArcInner<T> {
        unsafe { self.inner.as_ref() }
    }

    /// Returns the value if `this` is the last reference, or gives `this` back.
    pub(crate) fn try_unwrap(this: Self) -> Result<T, Self> {
        if this
            .inner()
            .ref_count
            .compare_exchange(1, 0, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(this);
        }

        let inner = this.inner;

        core::mem::forget(this);

        Ok(unsafe { Box::from_raw(inner.as_ptr()) }.value)
    }

    /// # Safety
    ///
    /// The reference count must have dropped to zero.
    #[inline(never)]
    unsafe fn drop_slow(&mut self) {
        fence(Ordering::Acquire);

        drop(unsafe { Box::from_raw(self.inner.as_ptr()) });
    }
}

impl<T> Clone for LightArc<T> {
    fn clone(&self) -> Self {
        let count = self.inner().ref_count.fetch_add(1, Ordering::Relaxed);

        debug_assert!(count > 0, "use after free");

        Self { inner: self.inner }
    }
}

impl<T> Drop for LightArc<T> {
    fn drop(&mut self) {
        if unlikely(self.inner().ref_count.fetch_sub(1, Ordering::Release) == 1) {
            unsafe { self.drop_slow() };
        }
    }
}

impl<T> std::ops::Deref for LightArc<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner().value
    }
}

unsafe impl<T: Send + Sync> Send for LightArc<T> {}
unsafe impl<T: Send + Sync> Sync for LightArc<T> {}
