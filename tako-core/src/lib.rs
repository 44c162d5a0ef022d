//! Board-agnostic core logic for the TakoGPU sprite co-processor
//!
//! Everything here runs on the host as well as on the target:
//!
//! - Command queue shared between the arrival and dispatch contexts
//! - Host transfer port (handshake lines plus a symbol engine)
//! - External PSRAM controller and its address map
//! - Sprite table, palettes and the per-scanline visibility index
//! - Command dispatcher and the shared status record
//! - Double-buffered scan-out
//! - Board configuration types

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod display;
pub mod memory;
pub mod queue;
pub mod sprite;
pub mod status;
pub mod traits;
pub mod transfer;
