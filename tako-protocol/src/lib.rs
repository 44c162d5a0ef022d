//! TakoGPU Host Command Protocol
//!
//! This crate defines the byte-level protocol between the host CPU and the
//! graphics co-processor. The host writes commands over an 8-bit parallel
//! bus; the device answers on the same bus when asked to.
//!
//! # Command Layout
//!
//! All multi-byte fields are little-endian:
//! ```text
//! ┌──────┬───────┬──────────────────────────────┐
//! │ KIND │ FLAGS │ PAYLOAD                      │
//! │ 1B   │ 1B    │ 0–2051B (depends on KIND)    │
//! └──────┴───────┴──────────────────────────────┘
//! ```
//!
//! FLAGS bit 7 requests a response, bit 6 marks a high-priority command and
//! bit 5 asks for a sprite-engine reset. Bits 6 and 5 are reserved hooks and
//! currently change nothing.
//!
//! Responses carry no framing: a single ack/boolean/error byte, or the
//! 8-byte [`StatusRecord`] for `STATUS`.

#![no_std]
#![deny(unsafe_code)]

pub mod assembler;
pub mod command;
pub mod header;
pub mod status;

pub use assembler::{AssembledCommand, CommandAssembler, MAX_COMMAND_LEN};
pub use command::{Command, CommandKind, DecodeError, SizeClass, SpriteUpdate, PALETTE_COLORS};
pub use header::{CommandFlags, CommandHeader, HEADER_LEN};
pub use status::{busy, ErrorCode, StatusCode, StatusRecord, STATUS_RECORD_LEN};
