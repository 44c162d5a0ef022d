//! Board pin assignment
//!
//! PIO blocks are split by function:
//!
//! | Block | SM0 | SM1 | SM2 |
//! |---|---|---|---|
//! | PIO0 | PSRAM QSPI | host bus | |
//! | PIO1 | panel SPI | | |
//! | PIO2 | line sync | | |

/// Host data bus D0..D7, consecutive from this pin
pub const HOST_D0: u8 = 0;
pub const HOST_DATA_PINS: u8 = 8;
/// Host chip select, active low
pub const HOST_CS: u8 = 8;
/// Host read (high) / write (low)
pub const HOST_RW: u8 = 9;
/// Ready (high) / busy (low) towards the host
pub const HOST_READY: u8 = 10;

pub const DISP_MOSI: u8 = 12;
pub const DISP_SCK: u8 = 13;
pub const DISP_CS: u8 = 14;
pub const DISP_DC: u8 = 15;
pub const DISP_RST: u8 = 16;
pub const DISP_BL: u8 = 17;

pub const PSRAM_SCK: u8 = 18;
/// PSRAM SIO0..SIO3, consecutive from this pin
pub const PSRAM_D0: u8 = 19;
pub const PSRAM_CS: u8 = 23;

pub const STATUS_LED: u8 = 25;

/// Pulsed once per scanline by the line-sync state machine
pub const LINE_SYNC: u8 = 26;

/// State machine indices within their PIO block
pub const SM_PSRAM: u8 = 0;
pub const SM_HOST: u8 = 1;
pub const SM_DISPLAY: u8 = 0;
pub const SM_LINE_SYNC: u8 = 0;
