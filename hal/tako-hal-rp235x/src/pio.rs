//! PIO block helpers
//!
//! Clock-divider math, FIFO addressing for DMA and the drain checks the
//! engines need before chip-select may rise. The microprograms themselves
//! are assembled next to the engines that run them.

use embassy_rp::pac;
use embassy_rp::pio::{Instance, StateMachine};
use fixed::types::U24F8;

/// Largest divider the 16.8 fixed-point register holds
const MAX_DIVIDER_BITS: u32 = 0xFFFF_FF00;

/// One of the three RP2350 PIO blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PioBlock {
    Pio0,
    Pio1,
    Pio2,
}

impl PioBlock {
    fn index(self) -> u8 {
        match self {
            PioBlock::Pio0 => 0,
            PioBlock::Pio1 => 1,
            PioBlock::Pio2 => 2,
        }
    }

    pub(crate) fn regs(self) -> pac::pio::Pio {
        match self {
            PioBlock::Pio0 => pac::PIO0,
            PioBlock::Pio1 => pac::PIO1,
            PioBlock::Pio2 => pac::PIO2,
        }
    }

    /// DREQ paced by `sm`'s TX FIFO
    pub fn tx_dreq(self, sm: u8) -> u8 {
        self.index() * 8 + sm
    }

    /// DREQ paced by `sm`'s RX FIFO
    pub fn rx_dreq(self, sm: u8) -> u8 {
        self.index() * 8 + 4 + sm
    }

    /// Bus address of `sm`'s TX FIFO
    pub fn txf_addr(self, sm: u8) -> u32 {
        self.regs().txf(sm as usize).as_ptr() as u32
    }

    /// Bus address of `sm`'s RX FIFO
    pub fn rxf_addr(self, sm: u8) -> u32 {
        self.regs().rxf(sm as usize).as_ptr() as u32
    }

    pub fn rx_is_empty(self, sm: u8) -> bool {
        self.regs().fstat().read().rxempty() & (1 << sm) != 0
    }

    /// Block until `sm` has shifted out everything queued for it
    ///
    /// Waits for an empty TX FIFO and then for the state machine to stall
    /// on its next pull.
    pub fn wait_tx_drained(self, sm: u8) {
        let regs = self.regs();
        let mask = 1u8 << sm;
        regs.fdebug().write(|w| w.set_txstall(mask));
        while regs.fstat().read().txempty() & mask == 0 {}
        while regs.fdebug().read().txstall() & mask == 0 {}
    }
}

/// Divider that runs a program at `cycles_per_bit` instructions per bit
///
/// Returns the raw 16.8 fixed-point bits. A zero rate yields the slowest
/// divider.
pub fn calc_clock_divider(sys_hz: u32, bit_hz: u32, cycles_per_bit: u32) -> u32 {
    let per_second = u64::from(bit_hz) * u64::from(cycles_per_bit);
    if per_second == 0 {
        return MAX_DIVIDER_BITS;
    }

    // 8 fractional bits; never run faster than the system clock
    let bits = (u64::from(sys_hz) * 256) / per_second;
    bits.clamp(0x100, u64::from(MAX_DIVIDER_BITS)) as u32
}

/// [`calc_clock_divider`] against the running system clock
pub fn clock_divider(bit_hz: u32, cycles_per_bit: u32) -> U24F8 {
    let sys_hz = embassy_rp::clocks::clk_sys_freq();
    U24F8::from_bits(calc_clock_divider(sys_hz, bit_hz, cycles_per_bit))
}

/// Force `sm` to continue at instruction memory address `addr`
pub(crate) fn jump<P: Instance, const SM: usize>(sm: &mut StateMachine<'_, P, SM>, addr: u8) {
    #[allow(unused_unsafe)]
    // SAFETY: `addr` is an entry point inside a program loaded for this SM
    unsafe {
        sm.exec_jmp(addr);
    }
}
