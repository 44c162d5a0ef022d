//! ST7789 TFT controller over a write-only SPI engine
//!
//! The SPI microprogram clocks one byte per symbol and acknowledges each
//! byte through its RX FIFO once it is on the wire, so every command or
//! parameter byte is `put` followed by `get`. Pixel data bypasses this
//! path: after [`Panel::begin_pixels`] the scan-out DMA feeds the engine
//! directly and the acks it produces are discarded in
//! [`Panel::end_pixels`].
//!
//! # Pixel format
//!
//! COLMOD selects RGB565. RAMCTRL switches the controller to little-endian
//! pixel order, so a `u16` frame buffer can be streamed byte by byte in
//! memory order.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use tako_core::config::{DisplayConfig, Rotation};
use tako_core::traits::Panel;
use tako_hal::{OutputPin, SymbolEngine};

/// Command opcodes
pub mod cmd {
    pub const NOP: u8 = 0x00;
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVON: u8 = 0x21;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const RAMCTRL: u8 = 0xB0;
}

/// MADCTL bits
pub mod madctl {
    /// Row address order
    pub const MY: u8 = 0x80;
    /// Column address order
    pub const MX: u8 = 0x40;
    /// Row/column exchange
    pub const MV: u8 = 0x20;
}

/// 16 bits per pixel, 65K colors
const COLMOD_RGB565: u8 = 0x55;

/// RAMCTRL parameters: RAM access from MCU, 18-bit bus, little endian
const RAMCTRL_LITTLE_ENDIAN: [u8; 2] = [0x00, 0xF8];

/// MADCTL value for a panel rotation
pub fn madctl_for(rotation: Rotation) -> u8 {
    match rotation {
        Rotation::Deg0 => 0,
        Rotation::Deg90 => madctl::MX | madctl::MV,
        Rotation::Deg180 => madctl::MX | madctl::MY,
        Rotation::Deg270 => madctl::MY | madctl::MV,
    }
}

/// Control lines of the panel
pub struct PanelPins<DC, CS, RST, BL> {
    /// Data (high) / command (low) select
    pub dc: DC,
    /// Chip select, active low
    pub cs: CS,
    /// Hardware reset, active low
    pub rst: RST,
    /// Backlight enable
    pub bl: BL,
}

/// ST7789 panel driver
pub struct St7789<E, DC, CS, RST, BL> {
    engine: E,
    pins: PanelPins<DC, CS, RST, BL>,
    rotation: Rotation,
}

impl<E, DC, CS, RST, BL> St7789<E, DC, CS, RST, BL>
where
    E: SymbolEngine,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
{
    /// Take the engine and pins; the panel is deselected and dark until
    /// [`Self::init`]
    pub fn new(engine: E, mut pins: PanelPins<DC, CS, RST, BL>, display: &DisplayConfig) -> Self {
        pins.cs.set_high();
        pins.dc.set_high();
        pins.rst.set_high();
        pins.bl.set_low();

        Self {
            engine,
            pins,
            rotation: display.rotation,
        }
    }

    /// Hardware reset and power-up sequence, ending with the backlight on
    pub fn init(&mut self, delay: &mut impl DelayNs) {
        self.pins.rst.set_low();
        delay.delay_ms(100);
        self.pins.rst.set_high();
        delay.delay_ms(100);

        self.write_command(cmd::SWRESET);
        delay.delay_ms(150);

        self.write_command(cmd::SLPOUT);
        delay.delay_ms(500);

        self.write_command(cmd::COLMOD);
        self.write_data(&[COLMOD_RGB565]);

        self.write_command(cmd::RAMCTRL);
        self.write_data(&RAMCTRL_LITTLE_ENDIAN);

        self.write_command(cmd::MADCTL);
        self.write_data(&[madctl_for(self.rotation)]);

        self.write_command(cmd::INVON);
        self.write_command(cmd::NORON);

        self.write_command(cmd::DISPON);
        delay.delay_ms(50);

        self.pins.bl.set_high();

        #[cfg(feature = "defmt")]
        defmt::info!("ST7789 ready, MADCTL {=u8:#x}", madctl_for(self.rotation));
    }

    pub fn set_backlight(&mut self, on: bool) {
        self.pins.bl.set_state(on);
    }

    fn transfer(&mut self, byte: u8) {
        self.engine.put(u32::from(byte));
        let _ = self.engine.get();
    }

    /// Send one command byte with D/C low
    pub fn write_command(&mut self, command: u8) {
        self.pins.dc.set_low();
        self.pins.cs.set_low();
        self.transfer(command);
        self.pins.cs.set_high();
    }

    /// Send parameter bytes with D/C high
    pub fn write_data(&mut self, bytes: &[u8]) {
        self.pins.dc.set_high();
        self.pins.cs.set_low();
        for &byte in bytes {
            self.transfer(byte);
        }
        self.pins.cs.set_high();
    }

    /// Hand the engine and pins back
    pub fn release(self) -> (E, PanelPins<DC, CS, RST, BL>) {
        (self.engine, self.pins)
    }
}

impl<E, DC, CS, RST, BL> Panel for St7789<E, DC, CS, RST, BL>
where
    E: SymbolEngine,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
{
    type Error = Infallible;

    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Infallible> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        self.write_command(cmd::CASET);
        self.write_data(&[x0h, x0l, x1h, x1l]);

        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.write_command(cmd::RASET);
        self.write_data(&[y0h, y0l, y1h, y1l]);
        Ok(())
    }

    fn begin_pixels(&mut self) -> Result<(), Infallible> {
        self.write_command(cmd::RAMWR);
        self.pins.dc.set_high();
        self.pins.cs.set_low();
        Ok(())
    }

    fn end_pixels(&mut self) -> Result<(), Infallible> {
        self.pins.cs.set_high();
        self.engine.drain_rx();
        Ok(())
    }
}
