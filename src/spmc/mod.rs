//! This module provides [`SpmcQueue`], the intrusive single-producer, multi-consumer queue.
mod queue;

pub use queue::*;
