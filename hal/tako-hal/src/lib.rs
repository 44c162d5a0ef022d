//! TakoGPU Hardware Abstraction Layer
//!
//! This crate defines the narrow capability traits the graphics core is
//! written against. The chip-specific HAL implements them on top of PIO
//! microprograms and DMA channels; host tests implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (tako-firmware)            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tako-core / tako-drivers               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tako-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ tako-hal-     │
//!             │    rp235x     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital level set/get
//! - [`engine::SymbolEngine`] - Move exactly one symbol per call
//! - [`dma::FifoDma`] - Blocking buffer transfer to/from an engine FIFO
//! - [`dma::ScanoutDma`] - Asynchronous pixel stream to the display engine
//! - [`bus::DataBus`] - Direction control of the shared host data bus

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod dma;
pub mod engine;
pub mod gpio;

// Re-export key traits at crate root for convenience
pub use bus::{BusDirection, DataBus};
pub use dma::{FifoDma, ScanoutDma};
pub use engine::{EngineMode, SymbolEngine};
pub use gpio::{InputPin, OutputPin};
