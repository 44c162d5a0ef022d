//! Board description compiled in from board.toml
//!
//! `build.rs` validates the file and emits the constants below.

use tako_core::config::{BoardConfig, DisplayConfig, MemoryConfig, Rotation};

include!(concat!(env!("OUT_DIR"), "/board.rs"));

/// Command slots in the arrival queue
pub const QUEUE_SLOTS: usize = 32;

/// Arena bytes; room for two full-size pattern loads
pub const QUEUE_ARENA: usize = 4096;

/// Frames between FPS reports and heartbeat toggles
pub const FPS_WINDOW: u32 = 60;
