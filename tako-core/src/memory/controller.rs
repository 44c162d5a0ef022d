//! APS6404 quad-SPI PSRAM controller
//!
//! Commands go out through the QSPI symbol engine, one opcode byte (or a
//! packed opcode/address word) per symbol. Payloads move by blocking DMA
//! between memory and the engine FIFOs. Chip-select is a plain GPIO.

use embedded_hal::delay::DelayNs;
use tako_hal::{FifoDma, OutputPin, SymbolEngine};

use super::map::{FRAME_BUFFERS, SPRITE_PATTERNS, TILEMAPS};
use crate::config::MemoryConfig;
use crate::traits::ExternalMemory;

const CMD_WRITE_QUAD: u32 = 0x38;
const CMD_FAST_READ_QUAD: u32 = 0xEB;
const CMD_ENTER_QUAD: u32 = 0x35;
const CMD_EXIT_QUAD: u32 = 0xF5;
const CMD_RESET_ENABLE: u32 = 0x66;
const CMD_RESET: u32 = 0x99;
const CMD_BURST_LENGTH: u32 = 0xC0;

/// Burst length argument for 1024-byte wrap
const BURST_1K: u32 = 0x02;

/// Symbol clocked out during the fast-read wait cycles
const DUMMY: u32 = 0xFF;

const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Bytes written to each test address by [`MemoryController::self_test`]
pub const SELF_TEST_PATTERN: [u8; 8] = [0x55, 0xAA, 0x33, 0xCC, 0xF0, 0x0F, 0xFF, 0x00];

/// Memory access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryError {
    /// Request runs past the end of the device
    OutOfRange,
}

/// Outcome of the boot-time memory check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestReport {
    pub passed: bool,
    /// Address of the first mismatching byte
    pub failed_address: u32,
    pub expected: u8,
    pub received: u8,
}

/// Owner of the external memory link
pub struct MemoryController<E: SymbolEngine, D: FifoDma, CS: OutputPin> {
    engine: E,
    dma: D,
    cs: CS,
    config: MemoryConfig,
}

impl<E: SymbolEngine, D: FifoDma, CS: OutputPin> MemoryController<E, D, CS> {
    /// Reset the device and switch it to quad mode
    ///
    /// `config` is expected to have passed
    /// [`BoardConfig::validate`](crate::config::BoardConfig::validate).
    pub fn new(engine: E, dma: D, mut cs: CS, config: MemoryConfig, delay: &mut impl DelayNs) -> Self {
        cs.set_high();
        let mut this = Self {
            engine,
            dma,
            cs,
            config,
        };

        this.command(&[CMD_RESET_ENABLE]);
        delay.delay_us(10);
        this.command(&[CMD_RESET]);
        delay.delay_ms(1);
        this.command(&[CMD_BURST_LENGTH, BURST_1K]);
        this.command(&[CMD_ENTER_QUAD]);

        this
    }

    /// Device size in bytes
    pub fn size(&self) -> u32 {
        self.config.size
    }

    fn command(&mut self, symbols: &[u32]) {
        self.cs.set_low();
        for &symbol in symbols {
            self.engine.put(symbol);
        }
        self.cs.set_high();
    }

    fn check_range(&self, address: u32, len: usize) -> Result<(), MemoryError> {
        let end = u64::from(address) + len as u64;
        if end > u64::from(self.config.size) {
            Err(MemoryError::OutOfRange)
        } else {
            Ok(())
        }
    }

    /// Write `bytes` starting at `address`
    ///
    /// A zero-length write succeeds without touching the bus. Once a request
    /// is in range it always reports success: the DMA wait has no failure
    /// path, so a faulty device only shows up in [`Self::self_test`].
    pub fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.check_range(address, bytes.len())?;

        self.cs.set_low();
        self.engine
            .put(CMD_WRITE_QUAD | ((address & ADDRESS_MASK) << 8));
        self.dma.write_to_fifo(bytes);
        self.cs.set_high();
        Ok(())
    }

    /// Fill `buffer` starting at `address`
    pub fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), MemoryError> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.check_range(address, buffer.len())?;

        self.cs.set_low();
        self.engine
            .put(CMD_FAST_READ_QUAD | ((address & ADDRESS_MASK) << 8));
        self.engine.put(DUMMY);
        self.dma.read_from_fifo(buffer);
        self.cs.set_high();
        Ok(())
    }

    /// Write and read back [`SELF_TEST_PATTERN`] at each region base and at
    /// the configured test address
    ///
    /// Stops at the first mismatching byte.
    pub fn self_test(&mut self, delay: &mut impl DelayNs) -> SelfTestReport {
        let addresses = [
            FRAME_BUFFERS.base,
            SPRITE_PATTERNS.base,
            TILEMAPS.base,
            self.config.test_address,
        ];
        let mut readback = [0u8; SELF_TEST_PATTERN.len()];

        for address in addresses {
            let io = self
                .write(address, &SELF_TEST_PATTERN)
                .and_then(|()| self.read(address, &mut readback));
            if io.is_err() {
                return SelfTestReport {
                    passed: false,
                    failed_address: address,
                    ..SelfTestReport::default()
                };
            }

            let mismatch = SELF_TEST_PATTERN
                .iter()
                .zip(readback.iter())
                .position(|(expected, received)| expected != received);
            if let Some(offset) = mismatch {
                return SelfTestReport {
                    passed: false,
                    failed_address: address + offset as u32,
                    expected: SELF_TEST_PATTERN[offset],
                    received: readback[offset],
                };
            }

            delay.delay_ms(1);
        }

        SelfTestReport {
            passed: true,
            ..SelfTestReport::default()
        }
    }

    /// Leave quad mode and hand the hardware back
    pub fn release(mut self) -> (E, D, CS) {
        self.command(&[CMD_EXIT_QUAD]);
        (self.engine, self.dma, self.cs)
    }
}

impl<E: SymbolEngine, D: FifoDma, CS: OutputPin> ExternalMemory for MemoryController<E, D, CS> {
    type Error = MemoryError;

    fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        MemoryController::write(self, address, bytes)
    }

    fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), MemoryError> {
        MemoryController::read(self, address, buffer)
    }
}
