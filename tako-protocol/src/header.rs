//! Command header decoding
//!
//! Every host command starts with a two byte header:
//! - KIND (1 byte): command identifier, see [`crate::CommandKind`]
//! - FLAGS (1 byte): independent option bits

use crate::command::DecodeError;

/// Size of the command header in bytes
pub const HEADER_LEN: usize = 2;

/// Flag bit: the host will read a response after this command
pub const FLAG_NEEDS_RESPONSE: u8 = 0x80;

/// Flag bit: reserved for queue reordering (no effect yet)
pub const FLAG_HIGH_PRIORITY: u8 = 0x40;

/// Flag bit: reserved for resetting sprite-engine state (no effect yet)
pub const FLAG_RESET_STATE: u8 = 0x20;

/// Command option bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFlags(u8);

impl CommandFlags {
    /// No flags set
    pub const NONE: Self = Self(0);

    /// Wrap a raw flags byte
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw flags byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Return these flags with `bits` also set
    pub const fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }

    /// Host expects a response
    pub const fn needs_response(self) -> bool {
        self.0 & FLAG_NEEDS_RESPONSE != 0
    }

    /// Command asked for priority handling
    pub const fn is_high_priority(self) -> bool {
        self.0 & FLAG_HIGH_PRIORITY != 0
    }

    /// Command asked for a sprite-engine reset first
    pub const fn resets_state(self) -> bool {
        self.0 & FLAG_RESET_STATE != 0
    }
}

/// Decoded command header
///
/// Immutable once framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandHeader {
    /// Raw command kind byte
    pub kind: u8,
    /// Option bits
    pub flags: CommandFlags,
}

impl CommandHeader {
    /// Create a header
    pub const fn new(kind: u8, flags: CommandFlags) -> Self {
        Self { kind, flags }
    }

    /// Decode the header at the front of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        match bytes {
            [kind, flags, ..] => Ok(Self {
                kind: *kind,
                flags: CommandFlags::from_bits(*flags),
            }),
            _ => Err(DecodeError::Truncated),
        }
    }

    /// Encode as wire bytes
    pub const fn to_bytes(self) -> [u8; HEADER_LEN] {
        [self.kind, self.flags.bits()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_header() {
        let header = CommandHeader::decode(&[0x08, 0x80, 0xAA]).unwrap();
        assert_eq!(header.kind, 0x08);
        assert!(header.flags.needs_response());
        assert!(!header.flags.is_high_priority());
        assert!(!header.flags.resets_state());
    }

    #[test]
    fn test_decode_short_header() {
        assert_eq!(CommandHeader::decode(&[]), Err(DecodeError::Truncated));
        assert_eq!(CommandHeader::decode(&[0x01]), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_flags_are_independent() {
        let flags = CommandFlags::NONE
            .with(FLAG_HIGH_PRIORITY)
            .with(FLAG_RESET_STATE);
        assert!(!flags.needs_response());
        assert!(flags.is_high_priority());
        assert!(flags.resets_state());
        assert_eq!(flags.bits(), 0x60);
    }
}
