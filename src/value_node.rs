//! The heap node of the queues that own their values.
use crate::error::AllocError;
use crate::loom_bindings::sync::atomic::AtomicPtr;
use crate::trace::warn;
use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};
use std::alloc::{alloc, handle_alloc_error, Layout};

pub(crate) struct ValueNode<T> {
    pub(crate) next: AtomicPtr<ValueNode<T>>,
    pub(crate) value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> ValueNode<T> {
    /// Allocates an empty node, reporting a failure instead of aborting.
    pub(crate) fn allocate() -> Result<NonNull<Self>, AllocError> {
        let layout = Layout::new::<Self>();
        let ptr = unsafe { alloc(layout) }.cast::<Self>();

        let Some(node) = NonNull::new(ptr) else {
            warn!(
                size = layout.size(),
                align = layout.align(),
                "failed to allocate a queue node"
            );

            return Err(AllocError { layout });
        };

        unsafe {
            node.as_ptr().write(Self {
                next: AtomicPtr::new(ptr::null_mut()),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        Ok(node)
    }

    /// Allocates the sentinel of a new queue, like `Box::new` does on failure.
    pub(crate) fn allocate_sentinel() -> NonNull<Self> {
        Self::allocate().unwrap_or_else(|err| handle_alloc_error(err.layout))
    }

    /// Frees a node without dropping its value.
    ///
    /// # Safety
    ///
    /// `node` must come from [`ValueNode::allocate`] and must not be used afterward.
    pub(crate) unsafe fn free(node: *mut Self) {
        drop(unsafe { Box::from_raw(node) });
    }

    /// Moves the value out.
    ///
    /// # Safety
    ///
    /// The value must be initialized, and it is uninitialized afterward.
    #[inline(always)]
    pub(crate) unsafe fn take_value(node: *mut Self) -> T {
        unsafe { (*(*node).value.get()).assume_init_read() }
    }

    /// # Safety
    ///
    /// The value must be uninitialized and the caller must have the only access to it.
    #[inline(always)]
    pub(crate) unsafe fn put_value(node: *mut Self, value: T) {
        unsafe { (*(*node).value.get()).write(value) };
    }
}
