#![deny(clippy::all)]
#![deny(clippy::assertions_on_result_states)]
#![deny(clippy::match_wild_err_arm)]
#![deny(clippy::allow_attributes_without_reason)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(
    clippy::missing_const_for_fn,
    reason = "Since we cannot make a constant function non-constant after its release,
    we need to look for a reason to make it constant, and not vice versa."
)]
#![allow(clippy::inline_always, reason = "We write highly optimized code.")]
#![allow(
    clippy::must_use_candidate,
    reason = "It is better to developer think about it."
)]
#![allow(
    clippy::module_name_repetitions,
    reason = "This is acceptable most of the time."
)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Unless the error is something special,
    the developer should document it."
)]
#![allow(clippy::redundant_pub_crate, reason = "It improves readability.")]
#![allow(clippy::struct_field_names, reason = "It improves readability.")]
#![allow(
    rustdoc::private_intra_doc_links,
    reason = "It allows to create more readable docs."
)]
//! Intrusive and node-based FIFO queues for every producer/consumer profile,
//! and the spinlock they are built on.
//!
//! | Queue                      | Producers | Consumers | Nodes                      |
//! |----------------------------|-----------|-----------|----------------------------|
//! | [`spsc::SpscQueue`]        | 1         | 1         | recycled, queue-owned      |
//! | [`spsc::SeqQueue`]         | 1         | 1         | caller-owned, [`SeqHook`]  |
//! | [`MpscQueue`]              | many      | 1         | caller-owned, [`Hook`]     |
//! | [`SpmcQueue`]              | 1         | many      | caller-owned, [`Hook`]     |
//! | [`MpmcQueue`]              | many      | many      | caller-owned, [`Hook`]     |
//! | [`ConcurrentQueue`]        | many      | many      | one heap node per value    |
//! | [`IntrusiveQueue`]         | `&mut`    | `&mut`    | caller-owned, [`Hook`]     |
//!
//! [`IntrusiveStack`] is the LIFO counterpart of [`IntrusiveQueue`].
//!
//! Intrusive queues never allocate: a node embeds a hook, declared with [`impl_linked!`],
//! and stays owned by the caller while it is enqueued. No queue blocks: `try_pop`
//! returns `None` when there is nothing to pop, and [`Backoff`] is there for callers
//! that want to wait.
//!
//! Enable the `tracing` feature to get the crate's events through `tracing`.
pub mod backoff;
pub mod cache_padded;
mod concurrent_queue;
mod consumer;
mod error;
mod hints;
mod hook;
mod intrusive;
mod light_arc;
#[cfg(all(hookq_loom, test))]
mod loom_tests;
mod loom_bindings;
pub mod mpmc;
pub mod mpsc;
mod producer;
pub mod spinlock;
pub mod spmc;
pub mod spsc;
#[cfg(all(test, not(hookq_loom)))]
mod test_lock;
#[cfg(test)]
mod test_utils;
mod trace;
mod value_node;

pub use backoff::{Backoff, DEFAULT_SPIN_COUNT};
pub use cache_padded::CachePadded;
pub use concurrent_queue::ConcurrentQueue;
pub use consumer::{LinkedConsumer, ValueConsumer};
pub use error::AllocError;
pub use hook::{Hook, Linked, SeqHook};
pub use intrusive::{IntrusiveQueue, IntrusiveStack};
pub use mpmc::MpmcQueue;
pub use mpsc::{MpscConsumer, MpscProducer, MpscQueue};
pub use producer::{LinkedProducer, ValueProducer};
pub use spinlock::{RawSpinlock, Spinlock, SpinlockExt, SpinlockGuard};
pub use spmc::SpmcQueue;
pub use trace::init_tracing;
