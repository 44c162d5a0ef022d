//! External memory subsystem
//!
//! - [`map`]: fixed region partition and pattern addressing
//! - [`controller`]: APS6404 bring-up, read/write and boot self-test

pub mod controller;
pub mod map;

pub use controller::{MemoryController, MemoryError, SelfTestReport, SELF_TEST_PATTERN};
pub use map::{pattern_address, Region, PATTERN_SLOTS, PATTERN_STRIDE};
