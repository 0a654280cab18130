//! This module provides single-producer, single-consumer queues.
//!
//! It contains two implementations:
//!
//! * [`SpscQueue`]: an unbounded queue of values over a pool of recycled nodes.
//!   Use [`SpscQueue::split`] for [`SpscProducer`] and [`SpscConsumer`].
//! * [`SeqQueue`]: an intrusive unbounded queue over [`SeqHook`](crate::SeqHook)
//!   with lazy batch reversal. Use [`SeqQueue::split`] for [`SeqProducer`] and [`SeqConsumer`].
mod cache_recycling;
mod seq_stamped;
#[cfg(all(test, not(hookq_loom)))]
mod tests;

pub use cache_recycling::*;
pub use seq_stamped::*;
