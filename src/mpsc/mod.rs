//! This module provides the intrusive multi-producer, single-consumer queue.
//!
//! * [`MpscQueue`]: the queue itself, with `unsafe` push and pop.
//! * [`MpscProducer`] and [`MpscConsumer`]: the handles returned by [`MpscQueue::split`].
//!
//! Its push path is shared with [`SpmcQueue`](crate::SpmcQueue) and
//! [`MpmcQueue`](crate::MpmcQueue).
mod queue;
mod split;

pub use queue::*;
pub use split::*;
