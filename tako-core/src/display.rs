//! Double-buffered scan-out
//!
//! Two equally sized RGB565 buffers in local RAM: the front one is streamed
//! to the panel by DMA while the back one is composed. Roles swap only when
//! no scan-out is in flight.

use tako_hal::ScanoutDma;
use tako_protocol::busy;

use crate::config::DisplayConfig;
use crate::status::SharedStatus;
use crate::traits::Panel;

/// Display path errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Buffers differ in size or do not match the panel geometry
    BufferSize,
    /// The panel driver reported a failure
    Panel,
}

/// Front/back pixel buffer pair
pub struct FrameBufferPair<'a> {
    buffers: [&'a mut [u16]; 2],
    back: usize,
}

impl<'a> FrameBufferPair<'a> {
    /// Pair two buffers; buffer `a` starts as the compose target
    pub fn new(a: &'a mut [u16], b: &'a mut [u16]) -> Result<Self, DisplayError> {
        if a.len() != b.len() || a.is_empty() {
            return Err(DisplayError::BufferSize);
        }
        Ok(Self {
            buffers: [a, b],
            back: 0,
        })
    }

    /// Pixels per buffer
    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }

    /// Compose target
    pub fn back_mut(&mut self) -> &mut [u16] {
        &mut *self.buffers[self.back]
    }

    pub fn back(&self) -> &[u16] {
        &*self.buffers[self.back]
    }

    /// Buffer being scanned out
    pub fn front(&self) -> &[u16] {
        &*self.buffers[self.back ^ 1]
    }

    fn flip(&mut self) {
        self.back ^= 1;
    }
}

/// Scan-out state machine driving a panel from a [`FrameBufferPair`]
pub struct DisplayScanout<'a, P: Panel, S: ScanoutDma> {
    panel: P,
    dma: S,
    buffers: FrameBufferPair<'a>,
    status: &'a SharedStatus,
    width: u16,
    height: u16,
    in_flight: bool,
}

impl<'a, P: Panel, S: ScanoutDma> DisplayScanout<'a, P, S> {
    pub fn new(
        panel: P,
        dma: S,
        buffers: FrameBufferPair<'a>,
        display: &DisplayConfig,
        status: &'a SharedStatus,
    ) -> Result<Self, DisplayError> {
        if buffers.len() != display.pixels() {
            return Err(DisplayError::BufferSize);
        }
        Ok(Self {
            panel,
            dma,
            buffers,
            status,
            width: display.width,
            height: display.height,
            in_flight: false,
        })
    }

    /// Compose target for the next frame
    pub fn back_mut(&mut self) -> &mut [u16] {
        self.buffers.back_mut()
    }

    /// Row `line` of the compose target
    pub fn back_row_mut(&mut self, line: u16) -> Option<&mut [u16]> {
        let width = self.width as usize;
        let start = line as usize * width;
        self.buffers.back_mut().get_mut(start..start + width)
    }

    /// True while the scan-out DMA is still moving pixels
    pub fn is_busy(&self) -> bool {
        self.in_flight && self.dma.is_busy()
    }

    /// Start streaming the composed buffer and make the other one the target
    ///
    /// Returns `Ok(false)` without doing anything while a previous scan-out
    /// is still in flight.
    pub fn swap_buffers(&mut self) -> Result<bool, DisplayError> {
        if self.in_flight {
            return Ok(false);
        }

        self.panel
            .set_window(0, 0, self.width - 1, self.height - 1)
            .map_err(|_| DisplayError::Panel)?;
        self.panel.begin_pixels().map_err(|_| DisplayError::Panel)?;

        self.status.set_busy(busy::DISPLAY | busy::DMA);
        self.dma.start(self.buffers.back());
        self.buffers.flip();
        self.in_flight = true;
        Ok(true)
    }

    /// Block until the running scan-out finishes
    ///
    /// Returns immediately when nothing is in flight.
    pub fn wait_for_frame_complete(&mut self) -> Result<(), DisplayError> {
        if !self.in_flight {
            return Ok(());
        }

        self.dma.wait();
        self.in_flight = false;
        self.status.clear_busy(busy::DISPLAY | busy::DMA);
        self.panel.end_pixels().map_err(|_| DisplayError::Panel)
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardConfig, Rotation};

    #[derive(Default)]
    struct PanelLog {
        window: Option<(u16, u16, u16, u16)>,
        open: bool,
        frames: usize,
    }

    impl Panel for PanelLog {
        type Error = ();

        fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), ()> {
            self.window = Some((x0, y0, x1, y1));
            Ok(())
        }

        fn begin_pixels(&mut self) -> Result<(), ()> {
            self.open = true;
            Ok(())
        }

        fn end_pixels(&mut self) -> Result<(), ()> {
            self.open = false;
            self.frames += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Dma {
        started: usize,
        first_pixel: u16,
        busy: bool,
    }

    impl ScanoutDma for Dma {
        fn start(&mut self, pixels: &[u16]) {
            self.started += 1;
            self.first_pixel = pixels[0];
            self.busy = true;
        }

        fn is_busy(&self) -> bool {
            self.busy
        }

        fn wait(&mut self) {
            self.busy = false;
        }
    }

    const TINY: DisplayConfig = DisplayConfig {
        width: 4,
        height: 2,
        rotation: Rotation::Deg0,
    };

    #[test]
    fn test_pair_rejects_mismatch() {
        let mut a = [0u16; 8];
        let mut b = [0u16; 7];
        assert!(FrameBufferPair::new(&mut a, &mut b).is_err());
    }

    #[test]
    fn test_scanout_rejects_wrong_geometry() {
        let mut a = [0u16; 8];
        let mut b = [0u16; 8];
        let pair = FrameBufferPair::new(&mut a, &mut b).unwrap();
        let status = SharedStatus::default();
        let result = DisplayScanout::new(
            PanelLog::default(),
            Dma::default(),
            pair,
            &BoardConfig::DEFAULT.display,
            &status,
        );
        assert!(matches!(result, Err(DisplayError::BufferSize)));
    }

    #[test]
    fn test_swap_streams_composed_buffer() {
        let mut a = [0u16; 8];
        let mut b = [0u16; 8];
        let pair = FrameBufferPair::new(&mut a, &mut b).unwrap();
        let status = SharedStatus::default();
        let mut scanout =
            DisplayScanout::new(PanelLog::default(), Dma::default(), pair, &TINY, &status).unwrap();

        scanout.back_mut()[0] = 0xAAAA;
        assert!(scanout.swap_buffers().unwrap());
        assert_eq!(scanout.dma.first_pixel, 0xAAAA);
        assert_eq!(scanout.panel.window, Some((0, 0, 3, 1)));
        assert!(scanout.panel.open);

        // New target is the other buffer
        assert_eq!(scanout.back_mut()[0], 0);
        assert_eq!(status.snapshot().busy_flags, busy::DISPLAY | busy::DMA);
    }

    #[test]
    fn test_swap_while_in_flight_is_noop() {
        let mut a = [0u16; 8];
        let mut b = [0u16; 8];
        let pair = FrameBufferPair::new(&mut a, &mut b).unwrap();
        let status = SharedStatus::default();
        let mut scanout =
            DisplayScanout::new(PanelLog::default(), Dma::default(), pair, &TINY, &status).unwrap();

        scanout.back_mut()[0] = 1;
        scanout.swap_buffers().unwrap();
        assert!(scanout.is_busy());
        scanout.back_mut()[0] = 2;
        assert!(!scanout.swap_buffers().unwrap());
        assert_eq!(scanout.dma.started, 1);
        assert_eq!(scanout.back_mut()[0], 2);

        scanout.wait_for_frame_complete().unwrap();
        assert!(!scanout.is_busy());
        assert_eq!(scanout.panel.frames, 1);
        assert_eq!(status.snapshot().busy_flags, 0);

        assert!(scanout.swap_buffers().unwrap());
        assert_eq!(scanout.dma.first_pixel, 2);
    }

    #[test]
    fn test_wait_without_frame() {
        let mut a = [0u16; 8];
        let mut b = [0u16; 8];
        let pair = FrameBufferPair::new(&mut a, &mut b).unwrap();
        let status = SharedStatus::default();
        let mut scanout =
            DisplayScanout::new(PanelLog::default(), Dma::default(), pair, &TINY, &status).unwrap();
        scanout.wait_for_frame_complete().unwrap();
        assert_eq!(scanout.panel.frames, 0);
    }

    #[test]
    fn test_back_row() {
        let mut a = [0u16; 8];
        let mut b = [0u16; 8];
        let pair = FrameBufferPair::new(&mut a, &mut b).unwrap();
        let status = SharedStatus::default();
        let mut scanout =
            DisplayScanout::new(PanelLog::default(), Dma::default(), pair, &TINY, &status).unwrap();

        scanout.back_row_mut(1).unwrap().fill(7);
        assert_eq!(&scanout.back_mut()[..], &[0, 0, 0, 0, 7, 7, 7, 7]);
        assert!(scanout.back_row_mut(2).is_none());
    }
}
