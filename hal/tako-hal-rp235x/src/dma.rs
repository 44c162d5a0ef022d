//! DMA between memory and PIO FIFOs
//!
//! Channels are programmed directly on the DMA block so the engine that
//! owns a state machine and the DMA that feeds its FIFO can be separate
//! objects. Transfers are byte-wide: a byte written to a TX FIFO is
//! replicated across the word, which MSB-first programs shift out from
//! the top.

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_rp::dma::Channel;
use embassy_rp::pac;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::Peri;
use tako_hal::{FifoDma, ScanoutDma};

use crate::pio::PioBlock;

struct Transfer {
    from: u32,
    to: u32,
    count: u32,
    incr_read: bool,
    incr_write: bool,
    dreq: u8,
}

fn start(channel: u8, t: Transfer) {
    let regs = pac::DMA.ch(channel as usize);
    compiler_fence(Ordering::SeqCst);
    regs.read_addr().write_value(t.from);
    regs.write_addr().write_value(t.to);
    regs.trans_count().write(|w| {
        w.set_mode(0.into());
        w.set_count(t.count);
    });
    regs.ctrl_trig().write(|w| {
        w.set_treq_sel(TreqSel::from(t.dreq));
        w.set_data_size(DataSize::SIZE_BYTE);
        w.set_incr_read(t.incr_read);
        w.set_incr_write(t.incr_write);
        w.set_chain_to(channel);
        w.set_en(true);
    });
    compiler_fence(Ordering::SeqCst);
}

fn is_busy(channel: u8) -> bool {
    pac::DMA.ch(channel as usize).ctrl_trig().read().busy()
}

fn wait(channel: u8) {
    while is_busy(channel) {}
    compiler_fence(Ordering::SeqCst);
}

/// Blocking byte DMA to and from one state machine's FIFOs
pub struct PioFifoDma<'d, C: Channel> {
    ch: Peri<'d, C>,
    block: PioBlock,
    sm: u8,
}

impl<'d, C: Channel> PioFifoDma<'d, C> {
    pub fn new(ch: Peri<'d, C>, block: PioBlock, sm: u8) -> Self {
        Self { ch, block, sm }
    }

    fn channel(&self) -> u8 {
        self.ch.number()
    }
}

impl<C: Channel> FifoDma for PioFifoDma<'_, C> {
    fn write_to_fifo(&mut self, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        let channel = self.channel();
        start(
            channel,
            Transfer {
                from: src.as_ptr() as u32,
                to: self.block.txf_addr(self.sm),
                count: src.len() as u32,
                incr_read: true,
                incr_write: false,
                dreq: self.block.tx_dreq(self.sm),
            },
        );
        wait(channel);
        // Chip-select may only rise once the last byte is on the wire
        self.block.wait_tx_drained(self.sm);
    }

    fn read_from_fifo(&mut self, dst: &mut [u8]) {
        if dst.is_empty() {
            return;
        }
        let channel = self.channel();
        start(
            channel,
            Transfer {
                from: self.block.rxf_addr(self.sm),
                to: dst.as_mut_ptr() as u32,
                count: dst.len() as u32,
                incr_read: false,
                incr_write: true,
                dreq: self.block.rx_dreq(self.sm),
            },
        );
        wait(channel);
    }
}

/// Background frame stream into the panel engine's TX FIFO
pub struct PioScanoutDma<'d, C: Channel> {
    ch: Peri<'d, C>,
    block: PioBlock,
    sm: u8,
    running: bool,
}

impl<'d, C: Channel> PioScanoutDma<'d, C> {
    pub fn new(ch: Peri<'d, C>, block: PioBlock, sm: u8) -> Self {
        Self {
            ch,
            block,
            sm,
            running: false,
        }
    }
}

impl<C: Channel> ScanoutDma for PioScanoutDma<'_, C> {
    fn start(&mut self, pixels: &[u16]) {
        if pixels.is_empty() {
            return;
        }
        start(
            self.ch.number(),
            Transfer {
                from: pixels.as_ptr() as u32,
                to: self.block.txf_addr(self.sm),
                count: (pixels.len() * 2) as u32,
                incr_read: true,
                incr_write: false,
                dreq: self.block.tx_dreq(self.sm),
            },
        );
        self.running = true;
    }

    fn is_busy(&self) -> bool {
        self.running && is_busy(self.ch.number())
    }

    fn wait(&mut self) {
        if !self.running {
            return;
        }
        wait(self.ch.number());
        self.block.wait_tx_drained(self.sm);
        self.running = false;
    }
}
