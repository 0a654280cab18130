//! This module provides [`MpmcQueue`], the intrusive multi-producer, multi-consumer queue.
mod queue;

pub use queue::*;
