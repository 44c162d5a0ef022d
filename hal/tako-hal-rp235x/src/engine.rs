//! Symbol engines on PIO state machines
//!
//! - [`PioEngine::host_bus`]: 8-bit parallel host link, strobed by host CS
//! - [`PioEngine::panel_spi`]: write-only SPI to the panel, one ack per byte
//! - [`QspiEngine`]: APS6404 link that switches between SPI, quad write and
//!   quad read as the command stream requires

use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, Instance, Pin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use tako_hal::{EngineMode, SymbolEngine};

use crate::pio::{clock_divider, jump, PioBlock};

/// Instruction addresses of the send/receive entry points
#[derive(Debug, Clone, Copy)]
struct Entries {
    send: u8,
    receive: u8,
}

/// Generic one-symbol engine
pub struct PioEngine<'d, P: Instance, const SM: usize> {
    sm: StateMachine<'d, P, SM>,
    block: PioBlock,
    entries: Entries,
    /// Left shift applied to pushed symbols for MSB-first programs
    tx_align: u8,
}

impl<'d, P: Instance, const SM: usize> PioEngine<'d, P, SM> {
    /// Parallel host bus on eight consecutive data pins
    ///
    /// `receive` samples the bus each time host CS (GPIO 8) falls; `send`
    /// drives one byte and acknowledges it once the host has strobed CS.
    /// Pin directions are switched by [`crate::gpio::HostDataBus`].
    pub fn host_bus(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, SM>,
        block: PioBlock,
        data: &[Pin<'d, P>; 8],
    ) -> Self {
        let prg = pio::pio_asm!(
            "public receive:",
            "    wait 0 gpio 8",
            "    in pins, 8",
            "    wait 1 gpio 8",
            "    jmp receive",
            "public send:",
            "    out pins, 8",
            "    wait 0 gpio 8",
            "    wait 1 gpio 8",
            "    in null, 8",
            "    jmp send",
        );
        let loaded = common.load_program(&prg.program);

        let pins: [&Pin<'d, P>; 8] = [
            &data[0], &data[1], &data[2], &data[3], &data[4], &data[5], &data[6], &data[7],
        ];
        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[]);
        cfg.set_out_pins(&pins);
        cfg.set_in_pins(&pins);
        cfg.shift_out = ShiftConfig {
            threshold: 8,
            direction: ShiftDirection::Right,
            auto_fill: true,
        };
        cfg.shift_in = ShiftConfig {
            threshold: 8,
            direction: ShiftDirection::Right,
            auto_fill: true,
        };
        sm.set_config(&cfg);
        // Output enable comes from the pad override
        sm.set_pin_dirs(PioDirection::In, &pins);

        let entries = Entries {
            send: loaded.origin + prg.public_defines.send as u8,
            receive: loaded.origin + prg.public_defines.receive as u8,
        };
        let mut engine = Self {
            sm,
            block,
            entries,
            tx_align: 0,
        };
        engine.restart(EngineMode::Receive);
        engine
    }

    /// SPI mode 0, MSB first, one ack word pushed per byte sent
    pub fn panel_spi(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, SM>,
        block: PioBlock,
        mosi: &Pin<'d, P>,
        sck: &Pin<'d, P>,
        bit_hz: u32,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".side_set 1",
            ".wrap_target",
            "public send:",
            "bitloop:",
            "    out pins, 1        side 0",
            "    jmp !osre bitloop  side 1",
            "    push noblock       side 0",
            ".wrap",
        );
        let loaded = common.load_program(&prg.program);

        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[sck]);
        cfg.set_out_pins(&[mosi]);
        cfg.shift_out = ShiftConfig {
            threshold: 8,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.clock_divider = clock_divider(bit_hz, 2);
        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[mosi, sck]);

        let send = loaded.origin + prg.public_defines.send as u8;
        let mut engine = Self {
            sm,
            block,
            entries: Entries {
                send,
                receive: send,
            },
            tx_align: 24,
        };
        engine.restart(EngineMode::Send);
        engine
    }
}

impl<P: Instance, const SM: usize> SymbolEngine for PioEngine<'_, P, SM> {
    fn restart(&mut self, mode: EngineMode) {
        let entry = match mode {
            EngineMode::Send => self.entries.send,
            EngineMode::Receive => self.entries.receive,
        };
        self.sm.set_enable(false);
        self.sm.clear_fifos();
        self.sm.restart();
        jump(&mut self.sm, entry);
        self.sm.set_enable(true);
    }

    fn put(&mut self, symbol: u32) {
        let word = symbol << self.tx_align;
        while !self.sm.tx().try_push(word) {}
    }

    fn get(&mut self) -> u32 {
        loop {
            if let Some(word) = self.sm.rx().try_pull() {
                return word;
            }
        }
    }

    fn rx_is_empty(&self) -> bool {
        self.block.rx_is_empty(SM as u8)
    }
}

const OP_WRITE_QUAD: u8 = 0x38;
const OP_FAST_READ_QUAD: u8 = 0xEB;
const OP_ENTER_QUAD: u8 = 0x35;
const OP_EXIT_QUAD: u8 = 0xF5;
const OP_BURST_LENGTH: u8 = 0xC0;

/// Where the next symbol belongs in the command being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opcode,
    Argument,
    Dummy,
}

/// PSRAM link
///
/// Symbols follow the controller's framing: the first symbol of each
/// command carries the opcode in its low byte and, for reads and writes, a
/// 24-bit address above it. A fast read is followed by one dummy symbol,
/// after which the engine turns the bus around and samples nibbles into
/// the RX FIFO until the next command.
pub struct QspiEngine<'d, P: Instance, const SM: usize> {
    sm: StateMachine<'d, P, SM>,
    block: PioBlock,
    spi: u8,
    quad: u8,
    read: u8,
    quad_mode: bool,
    phase: Phase,
}

impl<'d, P: Instance, const SM: usize> QspiEngine<'d, P, SM> {
    /// `data` are SIO0..SIO3 on consecutive pins
    pub fn new(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, SM>,
        block: PioBlock,
        sck: &Pin<'d, P>,
        data: &[Pin<'d, P>; 4],
        bit_hz: u32,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".side_set 1",
            "public spi:",
            "    set pindirs, 1      side 0",
            "spi_loop:",
            "    out pins, 1         side 0",
            "    jmp spi_loop        side 1",
            "public quad:",
            "    set pindirs, 15     side 0",
            "quad_loop:",
            "    out pins, 4         side 0",
            "    jmp quad_loop       side 1",
            "public read:",
            "    set pindirs, 0      side 0",
            "    set x, 5            side 0",
            "turnaround:",
            "    nop                 side 1",
            "    jmp x-- turnaround  side 0",
            "read_loop:",
            "    in pins, 4          side 0",
            "    jmp read_loop       side 1",
        );
        let loaded = common.load_program(&prg.program);

        let pins: [&Pin<'d, P>; 4] = [&data[0], &data[1], &data[2], &data[3]];
        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[sck]);
        cfg.set_out_pins(&pins);
        cfg.set_in_pins(&pins);
        cfg.set_set_pins(&pins);
        cfg.shift_out = ShiftConfig {
            threshold: 8,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.shift_in = ShiftConfig {
            threshold: 8,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.clock_divider = clock_divider(bit_hz, 2);
        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[sck]);

        let origin = loaded.origin;
        Self {
            sm,
            block,
            spi: origin + prg.public_defines.spi as u8,
            quad: origin + prg.public_defines.quad as u8,
            read: origin + prg.public_defines.read as u8,
            quad_mode: false,
            phase: Phase::Opcode,
        }
    }

    fn enter(&mut self, entry: u8) {
        self.sm.set_enable(false);
        self.sm.clear_fifos();
        self.sm.restart();
        jump(&mut self.sm, entry);
        self.sm.set_enable(true);
    }

    fn push_byte(&mut self, byte: u8) {
        while !self.sm.tx().try_push(u32::from(byte) << 24) {}
    }

    fn drain(&mut self) {
        self.block.wait_tx_drained(SM as u8);
    }
}

impl<P: Instance, const SM: usize> SymbolEngine for QspiEngine<'_, P, SM> {
    fn restart(&mut self, mode: EngineMode) {
        let entry = match (mode, self.quad_mode) {
            (EngineMode::Receive, _) => self.read,
            (EngineMode::Send, true) => self.quad,
            (EngineMode::Send, false) => self.spi,
        };
        self.phase = Phase::Opcode;
        self.enter(entry);
    }

    fn put(&mut self, symbol: u32) {
        match self.phase {
            Phase::Opcode => {
                let opcode = symbol as u8;
                self.restart(EngineMode::Send);
                self.push_byte(opcode);

                match opcode {
                    OP_WRITE_QUAD | OP_FAST_READ_QUAD => {
                        let [_, a2, a1, a0] = (symbol >> 8).to_be_bytes();
                        self.push_byte(a2);
                        self.push_byte(a1);
                        self.push_byte(a0);
                        if opcode == OP_FAST_READ_QUAD {
                            self.phase = Phase::Dummy;
                        }
                    }
                    OP_BURST_LENGTH => self.phase = Phase::Argument,
                    OP_ENTER_QUAD => {
                        self.drain();
                        self.quad_mode = true;
                    }
                    OP_EXIT_QUAD => {
                        self.drain();
                        self.quad_mode = false;
                    }
                    _ => self.drain(),
                }
            }
            Phase::Argument => {
                self.push_byte(symbol as u8);
                self.drain();
                self.phase = Phase::Opcode;
            }
            Phase::Dummy => {
                // The read entry clocks the wait cycles itself
                self.drain();
                self.enter(self.read);
                self.phase = Phase::Opcode;
            }
        }
    }

    fn get(&mut self) -> u32 {
        loop {
            if let Some(word) = self.sm.rx().try_pull() {
                return word & 0xFF;
            }
        }
    }

    fn rx_is_empty(&self) -> bool {
        self.block.rx_is_empty(SM as u8)
    }
}
