//! This module provides the intrusive links ([`Hook`] and [`SeqHook`]) that caller-owned
//! nodes embed, and the [`Linked`] trait that tells a queue where a node keeps its link.
//!
//! Queues thread hooks together (hook to hook) and recover the node from a hook by the
//! offset in [`Linked::HOOK_OFFSET`], so the same node type can embed several hooks
//! and live in several queues at once, one per hook.
use crate::loom_bindings::sync::atomic::{AtomicPtr, AtomicU32};
use core::fmt;
use core::ptr::{self, NonNull};
use std::sync::atomic::Ordering;

/// The link of [`MpscQueue`](crate::MpscQueue), [`SpmcQueue`](crate::SpmcQueue),
/// [`MpmcQueue`](crate::MpmcQueue) and [`IntrusiveQueue`](crate::IntrusiveQueue).
///
/// A hook can be in one queue at a time. While the node is enqueued only the queue
/// touches it; once the node is popped the caller owns it again.
///
/// # Examples
///
/// ```
/// use hookq::{impl_linked, Hook, MpmcQueue};
/// use std::ptr::NonNull;
///
/// struct Job {
///     hook: Hook,
///     id: u32,
/// }
///
/// impl_linked!(Job, hook: Hook);
///
/// let queue = MpmcQueue::<Job>::new();
/// let job = Job { hook: Hook::new(), id: 7 };
///
/// unsafe { queue.push(NonNull::from(&job)) };
///
/// let popped = queue.try_pop().unwrap();
///
/// assert_eq!(unsafe { popped.as_ref() }.id, 7);
/// ```
pub struct Hook {
    next: AtomicPtr<Hook>,
}

impl Hook {
    /// Creates a new cleared hook.
    pub fn new() -> Self {
        Self {
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Clears the link.
    ///
    /// A popped node keeps a stale link until it is cleared or pushed again.
    pub fn clear(&self) {
        self.next.store(ptr::null_mut(), Ordering::Relaxed);
    }

    /// Returns whether the link points to a successor.
    ///
    /// It is meaningful only for a node the caller owns.
    pub fn is_linked(&self) -> bool {
        !self.next.load(Ordering::Relaxed).is_null()
    }

    #[inline(always)]
    pub(crate) fn next(&self, order: Ordering) -> *mut Self {
        self.next.load(order)
    }

    #[inline(always)]
    pub(crate) fn set_next(&self, next: *mut Self, order: Ordering) {
        self.next.store(next, order);
    }
}

impl Default for Hook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish()
    }
}

/// The link of [`SeqQueue`](crate::spsc::SeqQueue): a successor pointer and
/// the sequence number the producer stamped on push.
pub struct SeqHook {
    next: AtomicPtr<SeqHook>,
    seq: AtomicU32,
}

impl SeqHook {
    /// Creates a new cleared hook.
    pub fn new() -> Self {
        Self {
            next: AtomicPtr::new(ptr::null_mut()),
            seq: AtomicU32::new(0),
        }
    }

    /// Clears the link and the sequence number.
    pub fn clear(&self) {
        self.next.store(ptr::null_mut(), Ordering::Relaxed);
        self.seq.store(0, Ordering::Relaxed);
    }

    /// Returns the sequence number stamped by the last push of this node.
    ///
    /// The first push into a queue stamps `1`, and every push stamps one more (wrapping).
    pub fn seq(&self) -> u32 {
        self.seq.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn next(&self) -> *mut Self {
        self.next.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn set_next(&self, next: *mut Self) {
        self.next.store(next, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn set_seq(&self, seq: u32) {
        self.seq.store(seq, Ordering::Relaxed);
    }
}

impl Default for SeqHook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SeqHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqHook")
            .field("next", &self.next.load(Ordering::Relaxed))
            .field("seq", &self.seq())
            .finish()
    }
}

/// A node type that embeds a hook of type `H`.
///
/// Prefer [`impl_linked!`](crate::impl_linked) to implementing it by hand.
///
/// # Safety
///
/// `HOOK_OFFSET` must be the byte offset of a field of type `H` inside `Self`.
pub unsafe trait Linked<H> {
    /// The byte offset of the hook inside the node.
    const HOOK_OFFSET: usize;
}

/// Implements [`Linked`] for a node type by naming its hook field.
///
/// The field type is checked at compile time.
///
/// ```
/// use hookq::{impl_linked, Hook, SeqHook};
///
/// struct Event {
///     ready: Hook,
///     log: SeqHook,
///     payload: [u8; 16],
/// }
///
/// // One node, two hooks: it can be in a ready-queue and a log queue at once.
/// impl_linked!(Event, ready: Hook);
/// impl_linked!(Event, log: SeqHook);
/// ```
#[macro_export]
macro_rules! impl_linked {
    ($node:ty, $field:ident : $hook:ty) => {
        const _: () = {
            #[allow(dead_code)]
            fn field_has_hook_type(node: &$node) -> &$hook {
                &node.$field
            }
        };

        unsafe impl $crate::Linked<$hook> for $node {
            const HOOK_OFFSET: usize = ::core::mem::offset_of!($node, $field);
        }
    };
}

/// Returns the hook embedded in `node`.
///
/// # Safety
///
/// `node` must point to a live `T`.
#[inline(always)]
pub(crate) unsafe fn hook_of<T: Linked<H>, H>(node: NonNull<T>) -> NonNull<H> {
    unsafe { NonNull::new_unchecked(node.as_ptr().cast::<u8>().add(T::HOOK_OFFSET).cast()) }
}

/// Returns the node that embeds `hook`.
///
/// # Safety
///
/// `hook` must be the `H` hook of a live `T`.
#[inline(always)]
pub(crate) unsafe fn node_of<T: Linked<H>, H>(hook: NonNull<H>) -> NonNull<T> {
    unsafe { NonNull::new_unchecked(hook.as_ptr().cast::<u8>().sub(T::HOOK_OFFSET).cast()) }
}

/// Allocates the stub of a stub-based queue.
///
/// The stub lives on the heap so that its address survives moves of the queue.
pub(crate) fn new_stub() -> NonNull<Hook> {
    NonNull::from(Box::leak(Box::new(Hook::new())))
}

/// Frees a stub allocated by [`new_stub`].
///
/// # Safety
///
/// `stub` must come from [`new_stub`] and must not be used afterward.
pub(crate) unsafe fn free_stub(stub: NonNull<Hook>) {
    drop(unsafe { Box::from_raw(stub.as_ptr()) });
}
