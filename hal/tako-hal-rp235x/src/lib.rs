//! RP2350-specific HAL for TakoGPU
//!
//! Implements the `tako-hal` capability traits on RP2350 peripherals:
//!
//! - [`gpio`]: embassy GPIO wrappers and the host data-bus direction control
//! - [`pio`]: PIO block registers, DREQs and clock dividers
//! - [`engine`]: symbol engines on PIO state machines (host bus, QSPI, panel SPI)
//! - [`dma`]: FIFO and scan-out DMA programmed directly on the DMA block
//! - [`pipeline`]: line-sync state machine standing in for the sprite pipeline
//! - [`pins`]: board pin assignment

#![no_std]

pub mod dma;
pub mod engine;
pub mod gpio;
pub mod pins;
pub mod pio;
pub mod pipeline;

pub use tako_hal::{BusDirection, DataBus, EngineMode, FifoDma, InputPin, OutputPin, ScanoutDma, SymbolEngine};
