//! This module provides the unsynchronized intrusive containers:
//! [`IntrusiveQueue`] (FIFO) and [`IntrusiveStack`] (LIFO).
use crate::hook::{hook_of, node_of, Hook, Linked};
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use std::sync::atomic::Ordering;

/// A single-threaded intrusive FIFO over the same [`Hook`] as the concurrent queues.
///
/// Push and pop are O(1) and take `&mut self`, so the borrow checker rules out
/// concurrent use. A node can move between an `IntrusiveQueue` and the concurrent queues
/// without touching its hook in between.
pub struct IntrusiveQueue<T> {
    head: Option<NonNull<Hook>>,
    tail: Option<NonNull<Hook>>,
    _marker: PhantomData<NonNull<T>>,
}

impl<T: Linked<Hook>> IntrusiveQueue<T> {
    /// Creates a new empty queue.
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            _marker: PhantomData,
        }
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Pushes `node` to the tail of the queue.
    ///
    /// # Safety
    ///
    /// `node` must point to a live `T` that stays valid until it is popped,
    /// and its hook must not be linked into any queue.
    pub unsafe fn push(&mut self, node: NonNull<T>) {
        let hook = unsafe { hook_of(node) };

        debug_assert!(
            self.tail != Some(hook) && !unsafe { hook.as_ref() }.is_linked(),
            "the node is still linked"
        );

        unsafe { hook.as_ref() }.set_next(ptr::null_mut(), Ordering::Relaxed);

        match self.tail {
            Some(tail) => unsafe { tail.as_ref() }.set_next(hook.as_ptr(), Ordering::Relaxed),
            None => self.head = Some(hook),
        }

        self.tail = Some(hook);
    }

    /// Pops the oldest node, or returns `None` if the queue is empty.
    ///
    /// The popped hook is cleared, so the node can be pushed anywhere right away.
    pub fn try_pop(&mut self) -> Option<NonNull<T>> {
        let head = self.head?;
        let hook = unsafe { head.as_ref() };

        self.head = NonNull::new(hook.next(Ordering::Relaxed));

        if self.head.is_none() {
            self.tail = None;
        }

        hook.clear();

        Some(unsafe { node_of(head) })
    }

    /// Moves every node of `other` to the tail of `self`, leaving `other` empty.
    pub fn append(&mut self, other: &mut Self) {
        let Some(other_head) = other.head.take() else {
            return;
        };

        match self.tail {
            Some(tail) => {
                unsafe { tail.as_ref() }.set_next(other_head.as_ptr(), Ordering::Relaxed);
            }
            None => self.head = Some(other_head),
        }

        self.tail = other.tail.take();
    }
}

impl<T: Linked<Hook>> Default for IntrusiveQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IntrusiveQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrusiveQueue")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish()
    }
}

unsafe impl<T: Send> Send for IntrusiveQueue<T> {}

/// A single-threaded intrusive LIFO over the same [`Hook`] as the queues.
///
/// Push and pop are O(1) and take `&mut self`. A popped node's hook is cleared,
/// so the node can be pushed to any queue or stack right away.
pub struct IntrusiveStack<T> {
    top: Option<NonNull<Hook>>,
    _marker: PhantomData<NonNull<T>>,
}

impl<T: Linked<Hook>> IntrusiveStack<T> {
    /// Creates a new empty stack.
    pub const fn new() -> Self {
        Self {
            top: None,
            _marker: PhantomData,
        }
    }

    /// Returns whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Returns the node on top of the stack without popping it.
    pub fn top(&self) -> Option<NonNull<T>> {
        self.top.map(|hook| unsafe { node_of(hook) })
    }

    /// Pushes `node` on top of the stack.
    ///
    /// # Safety
    ///
    /// `node` must point to a live `T` that stays valid until it is popped,
    /// and its hook must not be linked into any queue or stack.
    pub unsafe fn push(&mut self, node: NonNull<T>) {
        let hook = unsafe { hook_of(node) };

        debug_assert!(self.top != Some(hook), "the node is still linked");

        unsafe { hook.as_ref() }.set_next(
            self.top.map_or(ptr::null_mut(), NonNull::as_ptr),
            Ordering::Relaxed,
        );

        self.top = Some(hook);
    }

    /// Pops the newest node, or returns `None` if the stack is empty.
    pub fn try_pop(&mut self) -> Option<NonNull<T>> {
        let top = self.top?;
        let hook = unsafe { top.as_ref() };

        self.top = NonNull::new(hook.next(Ordering::Relaxed));

        hook.clear();

        Some(unsafe { node_of(top) })
    }
}

impl<T: Linked<Hook>> Default for IntrusiveStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IntrusiveStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrusiveStack")
            .field("top", &self.top)
            .finish()
    }
}

unsafe impl<T: Send> Send for IntrusiveStack<T> {}
