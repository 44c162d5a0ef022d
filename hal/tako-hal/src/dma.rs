//! DMA abstractions
//!
//! Two shapes of DMA are used by the core:
//!
//! - [`FifoDma`]: a blocking byte transfer between memory and an engine FIFO,
//!   paced by the engine's DREQ. Used by the external-memory controller.
//! - [`ScanoutDma`]: a pixel stream that runs in the background while the
//!   next frame is composed. Used by the display path.

/// Blocking buffer transfer to/from an engine FIFO
///
/// Both calls return only after the DMA channel signals completion.
/// There is no failure path: a wedged engine blocks forever.
pub trait FifoDma {
    /// Stream `src` into the engine's TX FIFO
    fn write_to_fifo(&mut self, src: &[u8]);

    /// Fill `dst` from the engine's RX FIFO
    fn read_from_fifo(&mut self, dst: &mut [u8]);
}

/// Background pixel stream into the display engine
pub trait ScanoutDma {
    /// Start streaming `pixels` and return immediately
    ///
    /// Implementations may keep reading `pixels` after this call returns.
    /// The caller must not write to that buffer until [`ScanoutDma::wait`]
    /// has returned.
    fn start(&mut self, pixels: &[u16]);

    /// Check whether a stream is still running
    fn is_busy(&self) -> bool;

    /// Block until the running stream (if any) completes
    fn wait(&mut self);
}
