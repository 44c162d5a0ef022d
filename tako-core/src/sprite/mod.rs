//! Sprite compositing state
//!
//! - [`Sprite`]: one sprite-table entry and its packed attribute bits
//! - [`store::SpriteStore`]: sprite table, palettes, pattern loading and the
//!   per-scanline visibility index
//! - [`compose::compose_line`]: software renderer for one scanline

pub mod compose;
pub mod store;

pub use compose::compose_line;
pub use store::{SpriteError, SpriteStore};

use tako_protocol::SizeClass;

/// Sprite table slots
pub const MAX_SPRITES: usize = 128;

/// Sprites the line pipeline can draw on one scanline
pub const MAX_SPRITES_PER_LINE: usize = 32;

/// Palette table entries
pub const PALETTE_COUNT: usize = 16;

/// `attr` bit layout
pub mod attr {
    pub const SIZE_MASK: u8 = 0x03;
    pub const HFLIP: u8 = 0x04;
    pub const VFLIP: u8 = 0x08;
    pub const PALETTE_MASK: u8 = 0x70;
    pub const PALETTE_SHIFT: u8 = 4;
    pub const PRIORITY: u8 = 0x80;
}

/// `ctrl` bit layout
pub mod ctrl {
    pub const ENABLE: u8 = 0x01;
    pub const TRANSPARENT: u8 = 0x02;
}

/// One sprite-table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sprite {
    pub x: u16,
    pub y: u16,
    pub pattern: u16,
    pub attr: u8,
    pub ctrl: u8,
}

impl Sprite {
    /// An inert slot
    pub const DISABLED: Self = Self {
        x: 0,
        y: 0,
        pattern: 0,
        attr: 0,
        ctrl: 0,
    };

    /// Size class from the attribute bits
    pub fn size(&self) -> Option<SizeClass> {
        SizeClass::from_bits(self.attr & attr::SIZE_MASK)
    }

    pub fn is_enabled(&self) -> bool {
        self.ctrl & ctrl::ENABLE != 0
    }

    pub fn is_transparent(&self) -> bool {
        self.ctrl & ctrl::TRANSPARENT != 0
    }

    pub fn hflip(&self) -> bool {
        self.attr & attr::HFLIP != 0
    }

    pub fn vflip(&self) -> bool {
        self.attr & attr::VFLIP != 0
    }

    /// Palette index (0-7)
    pub fn palette(&self) -> u8 {
        (self.attr & attr::PALETTE_MASK) >> attr::PALETTE_SHIFT
    }

    pub fn has_priority(&self) -> bool {
        self.attr & attr::PRIORITY != 0
    }
}
