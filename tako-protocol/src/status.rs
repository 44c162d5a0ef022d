//! Status record returned for STATUS commands
//!
//! Wire layout (8 bytes, packed): `[status, busy_flags, error, sprite_count,
//! frame_rate, reserved × 3]`

use crate::command::DecodeError;

/// Encoded status record length
pub const STATUS_RECORD_LEN: usize = 8;

/// Default frame rate reported before the display path measures one
pub const DEFAULT_FRAME_RATE: u8 = 60;

/// Busy flag bits
pub mod busy {
    pub const SPRITE: u8 = 0x01;
    pub const PATTERN: u8 = 0x02;
    pub const PALETTE: u8 = 0x04;
    pub const DISPLAY: u8 = 0x08;
    pub const DMA: u8 = 0x10;
    pub const QUEUE: u8 = 0x20;
}

/// Overall device status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    #[default]
    Ok,
    Busy,
    Error,
    InvalidCommand,
    BufferFull,
    InvalidParameter,
}

impl StatusCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(StatusCode::Ok),
            1 => Some(StatusCode::Busy),
            2 => Some(StatusCode::Error),
            3 => Some(StatusCode::InvalidCommand),
            4 => Some(StatusCode::BufferFull),
            5 => Some(StatusCode::InvalidParameter),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::Busy => 1,
            StatusCode::Error => 2,
            StatusCode::InvalidCommand => 3,
            StatusCode::BufferFull => 4,
            StatusCode::InvalidParameter => 5,
        }
    }
}

/// Last error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    #[default]
    None,
    InvalidSprite,
    InvalidPattern,
    InvalidPalette,
    MemoryFull,
    TransferFailed,
    Timeout,
    NotInitialized,
}

impl ErrorCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ErrorCode::None),
            1 => Some(ErrorCode::InvalidSprite),
            2 => Some(ErrorCode::InvalidPattern),
            3 => Some(ErrorCode::InvalidPalette),
            4 => Some(ErrorCode::MemoryFull),
            5 => Some(ErrorCode::TransferFailed),
            6 => Some(ErrorCode::Timeout),
            7 => Some(ErrorCode::NotInitialized),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ErrorCode::None => 0,
            ErrorCode::InvalidSprite => 1,
            ErrorCode::InvalidPattern => 2,
            ErrorCode::InvalidPalette => 3,
            ErrorCode::MemoryFull => 4,
            ErrorCode::TransferFailed => 5,
            ErrorCode::Timeout => 6,
            ErrorCode::NotInitialized => 7,
        }
    }
}

/// Snapshot of device status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusRecord {
    pub status: StatusCode,
    pub busy_flags: u8,
    pub error: ErrorCode,
    pub sprite_count: u8,
    pub frame_rate: u8,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            status: StatusCode::Ok,
            busy_flags: 0,
            error: ErrorCode::None,
            sprite_count: 0,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl StatusRecord {
    /// Encode to the 8-byte wire form; reserved bytes are zero
    pub fn to_bytes(&self) -> [u8; STATUS_RECORD_LEN] {
        [
            self.status.to_byte(),
            self.busy_flags,
            self.error.to_byte(),
            self.sprite_count,
            self.frame_rate,
            0,
            0,
            0,
        ]
    }

    /// Decode from the wire form (host side)
    ///
    /// Unknown status/error bytes map to `Error`/`None` rather than failing,
    /// so a newer device can still be read.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < STATUS_RECORD_LEN {
            return Err(DecodeError::Truncated);
        }
        Ok(Self {
            status: StatusCode::from_byte(bytes[0]).unwrap_or(StatusCode::Error),
            busy_flags: bytes[1],
            error: ErrorCode::from_byte(bytes[2]).unwrap_or_default(),
            sprite_count: bytes[3],
            frame_rate: bytes[4],
        })
    }

    pub fn is_busy(&self, flag: u8) -> bool {
        self.busy_flags & flag != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_bytes() {
        let record = StatusRecord::default();
        assert_eq!(record.to_bytes(), [0, 0, 0, 0, 60, 0, 0, 0]);
    }

    #[test]
    fn test_record_layout() {
        let record = StatusRecord {
            status: StatusCode::Busy,
            busy_flags: busy::SPRITE | busy::DMA,
            error: ErrorCode::InvalidSprite,
            sprite_count: 12,
            frame_rate: 58,
        };
        let bytes = record.to_bytes();
        assert_eq!(bytes, [1, 0x11, 1, 12, 58, 0, 0, 0]);
        assert_eq!(StatusRecord::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn test_record_truncated() {
        assert_eq!(
            StatusRecord::from_bytes(&[0, 0, 0]),
            Err(DecodeError::Truncated)
        );
    }

    #[test]
    fn test_code_bytes() {
        for b in 0..=5 {
            assert_eq!(StatusCode::from_byte(b).unwrap().to_byte(), b);
        }
        for b in 0..=7 {
            assert_eq!(ErrorCode::from_byte(b).unwrap().to_byte(), b);
        }
        assert_eq!(StatusCode::from_byte(6), None);
        assert_eq!(ErrorCode::from_byte(8), None);
    }
}
