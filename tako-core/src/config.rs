//! Board configuration
//!
//! Describes the panel geometry and the external memory fitted to a board.
//! The firmware generates one of these at build time from `board.toml`;
//! with the `serde` feature it can also be stored as postcard bytes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::memory::map::{
    ADDRESS_SPACE_LIMIT, DEFAULT_MEMORY_SIZE, DEFAULT_TEST_ADDRESS, MAPPED_END,
};
use crate::memory::SELF_TEST_PATTERN;

/// Rows in the per-line visibility table
pub const MAX_LINES: usize = 320;

/// Widest panel the compositor is sized for
pub const MAX_WIDTH: u16 = 480;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Zero-sized panel or larger than the compositor tables
    InvalidGeometry,
    /// Memory smaller than the region map or beyond 24-bit addressing
    InvalidMemorySize,
    /// Self-test address overlaps a region or runs past the end of memory
    InvalidTestAddress,
    /// Frame rate of zero
    InvalidFrameRate,
    /// Postcard encode/decode failure
    Serialization,
}

/// Panel orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Visible display geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    pub width: u16,
    pub height: u16,
    pub rotation: Rotation,
}

impl DisplayConfig {
    /// Pixels in one full frame
    pub const fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// External memory description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryConfig {
    /// Device size in bytes
    pub size: u32,
    /// Unassigned address the boot self-test writes to
    pub test_address: u32,
}

/// Complete board description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    pub display: DisplayConfig,
    pub memory: MemoryConfig,
    /// Nominal frame rate reported before one is measured
    pub frame_rate: u8,
}

impl BoardConfig {
    /// 320×240 ST7789 with a 4 MiB APS6404
    pub const DEFAULT: Self = Self {
        display: DisplayConfig {
            width: 320,
            height: 240,
            rotation: Rotation::Deg0,
        },
        memory: MemoryConfig {
            size: DEFAULT_MEMORY_SIZE,
            test_address: DEFAULT_TEST_ADDRESS,
        },
        frame_rate: 60,
    };

    /// Check the configuration against the compositor and memory limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.display;
        if d.width == 0 || d.height == 0 || d.width > MAX_WIDTH || d.height as usize > MAX_LINES {
            return Err(ConfigError::InvalidGeometry);
        }

        let m = &self.memory;
        if m.size < MAPPED_END || m.size > ADDRESS_SPACE_LIMIT {
            return Err(ConfigError::InvalidMemorySize);
        }

        let test_end = m
            .test_address
            .checked_add(SELF_TEST_PATTERN.len() as u32)
            .ok_or(ConfigError::InvalidTestAddress)?;
        if m.test_address < MAPPED_END || test_end > m.size {
            return Err(ConfigError::InvalidTestAddress);
        }

        if self.frame_rate == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }

        Ok(())
    }

    /// Serialize into `buf`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_postcard<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialization)
    }

    /// Deserialize and validate
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Serialization)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()));
        assert_eq!(BoardConfig::DEFAULT.display.pixels(), 76_800);
    }

    #[test]
    fn test_rejects_tall_panel() {
        let mut config = BoardConfig::DEFAULT;
        config.display.height = MAX_LINES as u16 + 1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidGeometry));

        config.display.height = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidGeometry));
    }

    #[test]
    fn test_landscape_480x320_fits() {
        let mut config = BoardConfig::DEFAULT;
        config.display.width = 480;
        config.display.height = 320;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_small_memory() {
        let mut config = BoardConfig::DEFAULT;
        config.memory.size = 0x10_0000;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMemorySize));
    }

    #[test]
    fn test_rejects_test_address_in_region() {
        let mut config = BoardConfig::DEFAULT;
        config.memory.test_address = 0x05_0000;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTestAddress));

        config.memory.test_address = DEFAULT_MEMORY_SIZE - 4;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTestAddress));
    }

    #[test]
    fn test_rejects_zero_frame_rate() {
        let mut config = BoardConfig::DEFAULT;
        config.frame_rate = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameRate));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_roundtrip() {
        let mut config = BoardConfig::DEFAULT;
        config.display.rotation = Rotation::Deg90;

        let mut buf = [0u8; 32];
        let used = config.to_postcard(&mut buf).unwrap().len();
        assert_eq!(BoardConfig::from_postcard(&buf[..used]), Ok(config));
    }
}
