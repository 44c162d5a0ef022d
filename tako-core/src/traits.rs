//! Seams between the core subsystems and their collaborators
//!
//! Hardware-facing capabilities live in `tako-hal`; these traits describe
//! the higher-level roles the dispatcher and frame loop need.

/// Sink for command responses
pub trait Responder {
    type Error;

    /// Deliver one complete response to the host
    fn respond(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Byte-addressed external memory
pub trait ExternalMemory {
    type Error;

    fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), Self::Error>;

    fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

/// Display panel as seen by the scan-out path
///
/// The panel accepts a window rectangle and then a raw RGB565 pixel stream.
pub trait Panel {
    type Error;

    /// Set the inclusive drawing window
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Self::Error>;

    /// Open a pixel stream into the current window
    ///
    /// After this returns the panel is ready for pixel data from DMA.
    fn begin_pixels(&mut self) -> Result<(), Self::Error>;

    /// Close the pixel stream
    fn end_pixels(&mut self) -> Result<(), Self::Error>;
}

/// Line-render hardware fed one scanline number at a time
pub trait LinePipeline {
    /// Hand a line number to the lookup stage
    fn submit_line(&mut self, line: u16);

    /// Check whether the compose stage has results waiting
    fn has_results(&self) -> bool;

    /// Pull one result word from the compose stage
    fn take_result(&mut self) -> u32;
}
