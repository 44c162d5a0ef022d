//! Command kinds and payload decoding
//!
//! Payload shapes (little-endian, packed):
//! - LOAD_PATTERN: `[pattern:u16][size_class:u8][bitmap: 32|128|512|2048]`
//! - LOAD_PALETTE: `[palette:u8][colors: 16 × u16 RGB565]`
//! - UPDATE_SPRITE: `[sprite:u8][x:u16][y:u16][pattern:u8][attr:u8][ctrl:u8]`
//! - ENABLE_SPRITE / DISABLE_SPRITE: `[sprite:u8]`
//! - SET_SCROLL: `[x:u16][y:u16][layer:u8]`
//! - NOP, INIT, STATUS, RESET: no payload

use crate::header::{CommandFlags, CommandHeader, HEADER_LEN};

/// Colors in one palette
pub const PALETTE_COLORS: usize = 16;

/// LOAD_PATTERN metadata bytes before the bitmap
pub const LOAD_PATTERN_META_LEN: usize = 3;

/// LOAD_PALETTE payload length
pub const LOAD_PALETTE_LEN: usize = 1 + PALETTE_COLORS * 2;

/// UPDATE_SPRITE payload length
pub const UPDATE_SPRITE_LEN: usize = 8;

/// ENABLE_SPRITE / DISABLE_SPRITE payload length
pub const SPRITE_INDEX_LEN: usize = 1;

/// SET_SCROLL payload length
pub const SET_SCROLL_LEN: usize = 5;

// Wire format values
const KIND_NOP: u8 = 0x00;
const KIND_INIT: u8 = 0x01;
const KIND_LOAD_PATTERN: u8 = 0x02;
const KIND_LOAD_PALETTE: u8 = 0x03;
const KIND_UPDATE_SPRITE: u8 = 0x04;
const KIND_ENABLE_SPRITE: u8 = 0x05;
const KIND_DISABLE_SPRITE: u8 = 0x06;
const KIND_SET_SCROLL: u8 = 0x07;
const KIND_STATUS: u8 = 0x08;
const KIND_RESET: u8 = 0xFF;

/// Errors from decoding or encoding command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Fewer bytes than the command kind requires
    Truncated,
    /// Size-class byte is not one of the four known classes
    InvalidSizeClass(u8),
    /// Output buffer too small for encoding
    BufferTooSmall,
}

/// Known command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Nop,
    Init,
    LoadPattern,
    LoadPalette,
    UpdateSprite,
    EnableSprite,
    DisableSprite,
    SetScroll,
    Status,
    Reset,
}

impl CommandKind {
    /// Parse a kind from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            KIND_NOP => Some(CommandKind::Nop),
            KIND_INIT => Some(CommandKind::Init),
            KIND_LOAD_PATTERN => Some(CommandKind::LoadPattern),
            KIND_LOAD_PALETTE => Some(CommandKind::LoadPalette),
            KIND_UPDATE_SPRITE => Some(CommandKind::UpdateSprite),
            KIND_ENABLE_SPRITE => Some(CommandKind::EnableSprite),
            KIND_DISABLE_SPRITE => Some(CommandKind::DisableSprite),
            KIND_SET_SCROLL => Some(CommandKind::SetScroll),
            KIND_STATUS => Some(CommandKind::Status),
            KIND_RESET => Some(CommandKind::Reset),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            CommandKind::Nop => KIND_NOP,
            CommandKind::Init => KIND_INIT,
            CommandKind::LoadPattern => KIND_LOAD_PATTERN,
            CommandKind::LoadPalette => KIND_LOAD_PALETTE,
            CommandKind::UpdateSprite => KIND_UPDATE_SPRITE,
            CommandKind::EnableSprite => KIND_ENABLE_SPRITE,
            CommandKind::DisableSprite => KIND_DISABLE_SPRITE,
            CommandKind::SetScroll => KIND_SET_SCROLL,
            CommandKind::Status => KIND_STATUS,
            CommandKind::Reset => KIND_RESET,
        }
    }

    /// Payload length for kinds whose length does not depend on payload content
    ///
    /// Returns `None` for LOAD_PATTERN, whose bitmap length comes from its
    /// size-class byte.
    pub fn fixed_payload_len(self) -> Option<usize> {
        match self {
            CommandKind::LoadPattern => None,
            CommandKind::LoadPalette => Some(LOAD_PALETTE_LEN),
            CommandKind::UpdateSprite => Some(UPDATE_SPRITE_LEN),
            CommandKind::EnableSprite | CommandKind::DisableSprite => Some(SPRITE_INDEX_LEN),
            CommandKind::SetScroll => Some(SET_SCROLL_LEN),
            CommandKind::Nop | CommandKind::Init | CommandKind::Status | CommandKind::Reset => {
                Some(0)
            }
        }
    }

    /// Number of response bytes the host reads back when it asks for one
    pub fn response_len(self) -> u16 {
        match self {
            CommandKind::Status => crate::status::STATUS_RECORD_LEN as u16,
            _ => 1,
        }
    }
}

/// Pattern/sprite dimension class
///
/// Patterns are 4 bits per pixel, square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SizeClass {
    /// 8×8 pixels, 32 bytes
    Size8,
    /// 16×16 pixels, 128 bytes
    Size16,
    /// 32×32 pixels, 512 bytes
    Size32,
    /// 64×64 pixels, 2048 bytes
    Size64,
}

impl SizeClass {
    /// Largest pattern bitmap in bytes
    pub const MAX_PATTERN_BYTES: usize = 2048;

    /// Parse the 2-bit size class value
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(SizeClass::Size8),
            1 => Some(SizeClass::Size16),
            2 => Some(SizeClass::Size32),
            3 => Some(SizeClass::Size64),
            _ => None,
        }
    }

    /// Wire value
    pub fn bits(self) -> u8 {
        match self {
            SizeClass::Size8 => 0,
            SizeClass::Size16 => 1,
            SizeClass::Size32 => 2,
            SizeClass::Size64 => 3,
        }
    }

    /// Edge length in pixels
    pub fn pixels(self) -> u16 {
        match self {
            SizeClass::Size8 => 8,
            SizeClass::Size16 => 16,
            SizeClass::Size32 => 32,
            SizeClass::Size64 => 64,
        }
    }

    /// Bitmap length at 4 bits per pixel
    pub fn pattern_bytes(self) -> usize {
        let edge = self.pixels() as usize;
        edge * edge / 2
    }
}

/// UPDATE_SPRITE payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpriteUpdate {
    pub sprite: u8,
    pub x: u16,
    pub y: u16,
    pub pattern: u8,
    pub attr: u8,
    pub ctrl: u8,
}

/// A decoded host command, borrowing bulk data from the command buffer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    Nop,
    Init,
    LoadPattern {
        pattern: u16,
        size: SizeClass,
        bitmap: &'a [u8],
    },
    LoadPalette {
        palette: u8,
        colors: [u16; PALETTE_COLORS],
    },
    UpdateSprite(SpriteUpdate),
    EnableSprite {
        sprite: u8,
    },
    DisableSprite {
        sprite: u8,
    },
    SetScroll {
        x: u16,
        y: u16,
        layer: u8,
    },
    Status,
    Reset,
    /// Kind byte not recognized; the header is still valid
    Unknown(u8),
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn require(payload: &[u8], len: usize) -> Result<(), DecodeError> {
    if payload.len() < len {
        Err(DecodeError::Truncated)
    } else {
        Ok(())
    }
}

impl<'a> Command<'a> {
    /// Decode a complete command buffer (header + payload)
    ///
    /// Trailing bytes beyond what the kind needs are ignored.
    pub fn decode(bytes: &'a [u8]) -> Result<(CommandHeader, Self), DecodeError> {
        let header = CommandHeader::decode(bytes)?;
        let payload = &bytes[HEADER_LEN..];
        let command = Self::decode_payload(header.kind, payload)?;
        Ok((header, command))
    }

    /// Decode the payload of a command of kind `kind`
    pub fn decode_payload(kind: u8, payload: &'a [u8]) -> Result<Self, DecodeError> {
        let Some(kind) = CommandKind::from_byte(kind) else {
            return Ok(Command::Unknown(kind));
        };

        match kind {
            CommandKind::Nop => Ok(Command::Nop),
            CommandKind::Init => Ok(Command::Init),
            CommandKind::Status => Ok(Command::Status),
            CommandKind::Reset => Ok(Command::Reset),
            CommandKind::LoadPattern => {
                require(payload, LOAD_PATTERN_META_LEN)?;
                let pattern = read_u16(payload, 0);
                let size =
                    SizeClass::from_bits(payload[2]).ok_or(DecodeError::InvalidSizeClass(payload[2]))?;
                let bitmap_len = size.pattern_bytes();
                require(payload, LOAD_PATTERN_META_LEN + bitmap_len)?;
                Ok(Command::LoadPattern {
                    pattern,
                    size,
                    bitmap: &payload[LOAD_PATTERN_META_LEN..LOAD_PATTERN_META_LEN + bitmap_len],
                })
            }
            CommandKind::LoadPalette => {
                require(payload, LOAD_PALETTE_LEN)?;
                let mut colors = [0u16; PALETTE_COLORS];
                for (i, color) in colors.iter_mut().enumerate() {
                    *color = read_u16(payload, 1 + i * 2);
                }
                Ok(Command::LoadPalette {
                    palette: payload[0],
                    colors,
                })
            }
            CommandKind::UpdateSprite => {
                require(payload, UPDATE_SPRITE_LEN)?;
                Ok(Command::UpdateSprite(SpriteUpdate {
                    sprite: payload[0],
                    x: read_u16(payload, 1),
                    y: read_u16(payload, 3),
                    pattern: payload[5],
                    attr: payload[6],
                    ctrl: payload[7],
                }))
            }
            CommandKind::EnableSprite => {
                require(payload, SPRITE_INDEX_LEN)?;
                Ok(Command::EnableSprite { sprite: payload[0] })
            }
            CommandKind::DisableSprite => {
                require(payload, SPRITE_INDEX_LEN)?;
                Ok(Command::DisableSprite { sprite: payload[0] })
            }
            CommandKind::SetScroll => {
                require(payload, SET_SCROLL_LEN)?;
                Ok(Command::SetScroll {
                    x: read_u16(payload, 0),
                    y: read_u16(payload, 2),
                    layer: payload[4],
                })
            }
        }
    }

    /// Wire kind byte of this command
    pub fn kind_byte(&self) -> u8 {
        match self {
            Command::Nop => KIND_NOP,
            Command::Init => KIND_INIT,
            Command::LoadPattern { .. } => KIND_LOAD_PATTERN,
            Command::LoadPalette { .. } => KIND_LOAD_PALETTE,
            Command::UpdateSprite(_) => KIND_UPDATE_SPRITE,
            Command::EnableSprite { .. } => KIND_ENABLE_SPRITE,
            Command::DisableSprite { .. } => KIND_DISABLE_SPRITE,
            Command::SetScroll { .. } => KIND_SET_SCROLL,
            Command::Status => KIND_STATUS,
            Command::Reset => KIND_RESET,
            Command::Unknown(kind) => *kind,
        }
    }

    /// Encode header and payload into `buffer` (host side and simulation)
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, flags: CommandFlags, buffer: &mut [u8]) -> Result<usize, DecodeError> {
        let mut writer = Writer { buffer, pos: 0 };
        writer.put(&CommandHeader::new(self.kind_byte(), flags).to_bytes())?;

        match self {
            Command::Nop | Command::Init | Command::Status | Command::Reset | Command::Unknown(_) => {}
            Command::LoadPattern {
                pattern,
                size,
                bitmap,
            } => {
                writer.put(&pattern.to_le_bytes())?;
                writer.put(&[size.bits()])?;
                writer.put(bitmap)?;
            }
            Command::LoadPalette { palette, colors } => {
                writer.put(&[*palette])?;
                for color in colors {
                    writer.put(&color.to_le_bytes())?;
                }
            }
            Command::UpdateSprite(update) => {
                writer.put(&[update.sprite])?;
                writer.put(&update.x.to_le_bytes())?;
                writer.put(&update.y.to_le_bytes())?;
                writer.put(&[update.pattern, update.attr, update.ctrl])?;
            }
            Command::EnableSprite { sprite } | Command::DisableSprite { sprite } => {
                writer.put(&[*sprite])?;
            }
            Command::SetScroll { x, y, layer } => {
                writer.put(&x.to_le_bytes())?;
                writer.put(&y.to_le_bytes())?;
                writer.put(&[*layer])?;
            }
        }

        Ok(writer.pos)
    }
}

struct Writer<'b> {
    buffer: &'b mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let end = self.pos + bytes.len();
        if end > self.buffer.len() {
            return Err(DecodeError::BufferTooSmall);
        }
        self.buffer[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}
