//! Static partition of the external RAM address space
//!
//! Regions never move at runtime. Assets are addressed as
//! `base + index * stride`.

/// A contiguous address range in external memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub base: u32,
    pub size: u32,
}

impl Region {
    pub const fn new(base: u32, size: u32) -> Self {
        Self { base, size }
    }

    /// First address past the region
    pub const fn end(&self) -> u32 {
        self.base + self.size
    }

    pub const fn contains(&self, address: u32) -> bool {
        address >= self.base && address < self.end()
    }
}

/// Frame buffers, `[0x000000, 0x050000)`
pub const FRAME_BUFFERS: Region = Region::new(0x00_0000, 0x05_0000);

/// Sprite pattern bitmaps, `[0x050000, 0x100000)`
pub const SPRITE_PATTERNS: Region = Region::new(0x05_0000, 0x0B_0000);

/// Tilemaps, `[0x100000, 0x200000)`
pub const TILEMAPS: Region = Region::new(0x10_0000, 0x10_0000);

/// End of the partitioned space; everything above is unassigned
pub const MAPPED_END: u32 = TILEMAPS.end();

/// Address space of the APS6404 (4 MiB)
pub const DEFAULT_MEMORY_SIZE: u32 = 0x40_0000;

/// Unassigned address exercised by the boot self-test
pub const DEFAULT_TEST_ADDRESS: u32 = 0x30_0000;

/// Largest address the 24-bit command field can carry, plus one
pub const ADDRESS_SPACE_LIMIT: u32 = 1 << 24;

/// Bytes reserved per pattern regardless of its size class
pub const PATTERN_STRIDE: u32 = 2048;

/// Pattern slots that fit inside [`SPRITE_PATTERNS`]
pub const PATTERN_SLOTS: u16 = (SPRITE_PATTERNS.size / PATTERN_STRIDE) as u16;

/// Address of pattern `index`, or `None` past the last slot
pub const fn pattern_address(index: u16) -> Option<u32> {
    if index >= PATTERN_SLOTS {
        None
    } else {
        Some(SPRITE_PATTERNS.base + index as u32 * PATTERN_STRIDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_are_adjacent() {
        assert_eq!(FRAME_BUFFERS.end(), SPRITE_PATTERNS.base);
        assert_eq!(SPRITE_PATTERNS.end(), TILEMAPS.base);
        assert_eq!(MAPPED_END, 0x20_0000);
    }

    #[test]
    fn test_pattern_addresses() {
        assert_eq!(pattern_address(0), Some(0x05_0000));
        assert_eq!(pattern_address(3), Some(0x05_0000 + 3 * 2048));
        assert_eq!(PATTERN_SLOTS, 352);

        let last = pattern_address(PATTERN_SLOTS - 1).unwrap();
        assert!(SPRITE_PATTERNS.contains(last + PATTERN_STRIDE - 1));
        assert_eq!(pattern_address(PATTERN_SLOTS), None);
    }

    #[test]
    fn test_test_address_unassigned() {
        assert!(!FRAME_BUFFERS.contains(DEFAULT_TEST_ADDRESS));
        assert!(!SPRITE_PATTERNS.contains(DEFAULT_TEST_ADDRESS));
        assert!(!TILEMAPS.contains(DEFAULT_TEST_ADDRESS));
        assert!(DEFAULT_TEST_ADDRESS < DEFAULT_MEMORY_SIZE);
    }
}
