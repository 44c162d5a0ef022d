//! Peripheral drivers
//!
//! Concrete implementations of the `tako-core` traits for the parts
//! fitted to TakoGPU boards:
//!
//! - ST7789 SPI panel (implements [`tako_core::traits::Panel`])

#![no_std]
#![deny(unsafe_code)]

pub mod st7789;
