//! Foreground context (core 0)
//!
//! Once per frame: drain the command queue through the dispatcher, rebuild
//! the scanline visibility lists, compose every line into the back buffer,
//! then hand it to the scan-out as soon as the previous frame has left.

use defmt::*;
use embassy_futures::yield_now;
use embassy_time::Instant;
use tako_core::dispatch::Dispatcher;
use tako_core::sprite::{compose_line, SpriteStore};
use tako_core::status::SharedStatus;
use tako_hal::OutputPin;
use tako_hal_rp235x::gpio::RpOutput;

use crate::board::{BACKDROP, FPS_WINDOW, QUEUE_ARENA};
use crate::channels::ChannelResponder;
use crate::hw::{FirmwareQueue, Lines, Psram, Scanout};

/// Everything the frame loop owns
pub struct Foreground {
    pub memory: Psram,
    pub sprites: SpriteStore,
    pub scanout: Scanout,
    pub lines: Lines,
    pub queue: &'static FirmwareQueue,
    pub status: &'static SharedStatus,
    pub led: RpOutput<'static>,
    /// Pop target, sized for the whole arena
    pub command: &'static mut [u8; QUEUE_ARENA],
}

impl Foreground {
    /// Run every queued command in arrival order
    fn drain_queue(&mut self) {
        let mut responder = ChannelResponder;
        while let Some(popped) = self.queue.pop(self.command) {
            let mut dispatcher = Dispatcher::new(&mut self.sprites, &mut self.memory, self.status);
            // Replies never fail; the channel blocks instead
            let _ = dispatcher.process(&self.command[..popped.len], &mut responder);
        }
    }

    /// Compose the back buffer line by line
    fn render(&mut self) {
        self.sprites.start_frame();

        for line in 0..self.sprites.height() {
            if let Err(e) = self.sprites.prepare_line(line, &mut self.lines) {
                warn!("Line {} not prepared: {}", line, e);
                continue;
            }
            let Some(row) = self.scanout.back_row_mut(line) else {
                continue;
            };
            if let Err(e) = compose_line(&self.sprites, &mut self.memory, line, row, BACKDROP) {
                warn!("Line {} compose failed: {}", line, e);
            }
        }
    }

    /// Stream the composed frame, waiting out the one still in flight
    fn present(&mut self) {
        if let Err(e) = self.scanout.wait_for_frame_complete() {
            error!("Scan-out failed: {}", e);
        }
        match self.scanout.swap_buffers() {
            Ok(true) => {}
            Ok(false) => warn!("Frame skipped, scan-out still busy"),
            Err(e) => error!("Frame not started: {}", e),
        }
    }
}

/// Frame loop; never returns
pub async fn foreground_loop(mut fg: Foreground) -> ! {
    info!("Entering frame loop");

    let mut frame_count: u32 = 0;
    let mut last = Instant::now();

    loop {
        frame_count = frame_count.wrapping_add(1);

        fg.drain_queue();
        fg.render();
        fg.present();

        if frame_count % FPS_WINDOW == 0 {
            fg.led.toggle();

            let now = Instant::now();
            let elapsed_us = now.duration_since(last).as_micros().max(1);
            let fps = (u64::from(FPS_WINDOW) * 1_000_000 / elapsed_us).min(u64::from(u8::MAX));
            fg.status.set_frame_rate(fps as u8);
            info!("FPS: {}", fps);
            last = now;
        }

        yield_now().await;
    }
}
