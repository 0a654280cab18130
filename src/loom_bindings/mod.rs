//! This module abstracts over `loom` and `std::sync` depending on whether we
//! are running loom models or not.
//!
//! Every atomic shared between a producer and a consumer goes through here, so
//! building the tests with `RUSTFLAGS="--cfg hookq_loom"` model-checks them.

#![allow(unused)]

#[cfg(not(all(test, hookq_loom)))]
mod std;
#[cfg(not(all(test, hookq_loom)))]
pub use self::std::*;

#[cfg(all(test, hookq_loom))]
mod mocked;
#[cfg(all(test, hookq_loom))]
pub use self::mocked::*;
