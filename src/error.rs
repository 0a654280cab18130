//! Errors returned by the node-allocating queues.
use std::alloc::Layout;

/// The global allocator could not provide memory for a queue node.
///
/// Only the queues that own their nodes ([`SpscQueue`](crate::spsc::SpscQueue)
/// and [`ConcurrentQueue`](crate::ConcurrentQueue)) can return it.
/// Intrusive queues never allocate and therefore never fail.
///
/// The value passed to the failed `push` is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to allocate a queue node of {} bytes (align {})", .layout.size(), .layout.align())]
pub struct AllocError {
    /// The layout of the node that could not be allocated.
    pub layout: Layout,
}
