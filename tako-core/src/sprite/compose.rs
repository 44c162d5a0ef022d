//! Software scanline compositor
//!
//! Renders one line of the frame from the visibility list built by
//! [`SpriteStore::start_frame`]. Pattern rows are fetched from external
//! memory; pixels are 4bpp with the high nibble first.
//!
//! Draw order: sprites without the priority bit first, then those with it.
//! Within each group lower table indices end up on top.

use super::{Sprite, SpriteStore};
use crate::memory::pattern_address;
use crate::traits::ExternalMemory;

/// Longest pattern row in bytes (64 pixels at 4bpp)
const MAX_ROW_BYTES: usize = 32;

/// Render scanline `line` into `row`
///
/// `row` is filled with `backdrop` first. Sprites whose pattern index has no
/// slot are skipped. With the transparency bit set, color index 0 is not
/// drawn.
pub fn compose_line<M: ExternalMemory>(
    store: &SpriteStore,
    memory: &mut M,
    line: u16,
    row: &mut [u16],
    backdrop: u16,
) -> Result<(), M::Error> {
    row.fill(backdrop);

    let visible = store.line_sprites(line);
    for priority in [false, true] {
        for &index in visible.iter().rev() {
            let Some(sprite) = store.sprite(index) else {
                continue;
            };
            if sprite.has_priority() != priority {
                continue;
            }
            draw_sprite_row(store, memory, sprite, line, row)?;
        }
    }
    Ok(())
}

fn draw_sprite_row<M: ExternalMemory>(
    store: &SpriteStore,
    memory: &mut M,
    sprite: &Sprite,
    line: u16,
    row: &mut [u16],
) -> Result<(), M::Error> {
    let (Some(size), Some(base)) = (sprite.size(), pattern_address(sprite.pattern)) else {
        return Ok(());
    };
    let Some(palette) = store.palette(sprite.palette()) else {
        return Ok(());
    };

    let edge = size.pixels();
    let mut y = line.wrapping_sub(sprite.y);
    if y >= edge {
        return Ok(());
    }
    if sprite.vflip() {
        y = edge - 1 - y;
    }

    let row_bytes = edge as usize / 2;
    let mut bits = [0u8; MAX_ROW_BYTES];
    memory.read(base + u32::from(y) * row_bytes as u32, &mut bits[..row_bytes])?;

    for px in 0..edge {
        let x = (sprite.x + px) as usize;
        if x >= row.len() {
            break;
        }
        let src = if sprite.hflip() { edge - 1 - px } else { px } as usize;
        let shift = if src % 2 == 0 { 4 } else { 0 };
        let color = (bits[src / 2] >> shift) & 0x0F;
        if color == 0 && sprite.is_transparent() {
            continue;
        }
        row[x] = palette[color as usize];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::sprite::{attr, ctrl};
    use tako_protocol::{SizeClass, PALETTE_COLORS};

    /// Flat byte array standing in for the pattern region
    struct Ram {
        bytes: [u8; 4 * 2048],
    }

    impl Ram {
        fn offset(address: u32) -> usize {
            (address - crate::memory::map::SPRITE_PATTERNS.base) as usize
        }
    }

    impl ExternalMemory for Ram {
        type Error = ();

        fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), ()> {
            let at = Self::offset(address);
            self.bytes[at..at + bytes.len()].copy_from_slice(bytes);
            Ok(())
        }

        fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), ()> {
            let at = Self::offset(address);
            buffer.copy_from_slice(&self.bytes[at..at + buffer.len()]);
            Ok(())
        }
    }

    fn setup() -> (SpriteStore, Ram) {
        let mut store = SpriteStore::new(&BoardConfig::DEFAULT.display).unwrap();
        let mut ram = Ram {
            bytes: [0; 4 * 2048],
        };

        let mut colors = [0u16; PALETTE_COLORS];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = 0x100 + i as u16;
        }
        store.load_palette(0, &colors).unwrap();

        // Pattern 0: 8x8, every row is 0,1,2,3,4,5,6,7
        let mut bitmap = [0u8; 32];
        for row in bitmap.chunks_mut(4) {
            row.copy_from_slice(&[0x01, 0x23, 0x45, 0x67]);
        }
        store
            .load_pattern(&mut ram, 0, &bitmap, SizeClass::Size8)
            .unwrap();

        // Pattern 1: 8x8 solid color 9
        store
            .load_pattern(&mut ram, 1, &[0x99; 32], SizeClass::Size8)
            .unwrap();

        (store, ram)
    }

    fn sprite(x: u16, y: u16, pattern: u16, attr: u8, ctrl: u8) -> Sprite {
        Sprite {
            x,
            y,
            pattern,
            attr,
            ctrl,
        }
    }

    #[test]
    fn test_backdrop_only() {
        let (mut store, mut ram) = setup();
        store.start_frame();
        let mut row = [0u16; 320];
        compose_line(&store, &mut ram, 0, &mut row, 0x1234).unwrap();
        assert!(row.iter().all(|&p| p == 0x1234));
    }

    #[test]
    fn test_opaque_row() {
        let (mut store, mut ram) = setup();
        store
            .update_sprite(0, sprite(10, 5, 0, 0, ctrl::ENABLE))
            .unwrap();
        store.start_frame();

        let mut row = [0u16; 320];
        compose_line(&store, &mut ram, 7, &mut row, 0).unwrap();
        assert_eq!(&row[10..18], &[0x100, 0x101, 0x102, 0x103, 0x104, 0x105, 0x106, 0x107]);
        assert_eq!(row[18], 0);
    }

    #[test]
    fn test_hflip_and_transparency() {
        let (mut store, mut ram) = setup();
        store
            .update_sprite(0, sprite(0, 0, 0, attr::HFLIP, ctrl::ENABLE | ctrl::TRANSPARENT))
            .unwrap();
        store.start_frame();

        let mut row = [0xFFFFu16; 320];
        compose_line(&store, &mut ram, 0, &mut row, 0xEEEE).unwrap();
        assert_eq!(row[0], 0x107);
        assert_eq!(row[6], 0x101);
        // Color 0 is see-through
        assert_eq!(row[7], 0xEEEE);
    }

    #[test]
    fn test_clipped_at_right_edge() {
        let (mut store, mut ram) = setup();
        store
            .update_sprite(0, sprite(316, 0, 1, 0, ctrl::ENABLE))
            .unwrap();
        store.start_frame();

        let mut row = [0u16; 320];
        compose_line(&store, &mut ram, 0, &mut row, 0).unwrap();
        assert_eq!(&row[316..], &[0x109; 4]);
    }

    #[test]
    fn test_priority_draws_last() {
        let (mut store, mut ram) = setup();
        // Sprite 0 would be on top by index, but sprite 1 has priority
        store
            .update_sprite(0, sprite(0, 0, 0, 0, ctrl::ENABLE))
            .unwrap();
        store
            .update_sprite(1, sprite(0, 0, 1, attr::PRIORITY, ctrl::ENABLE))
            .unwrap();
        store.start_frame();

        let mut row = [0u16; 320];
        compose_line(&store, &mut ram, 0, &mut row, 0).unwrap();
        assert_eq!(row[0], 0x109);
    }

    #[test]
    fn test_lower_index_on_top() {
        let (mut store, mut ram) = setup();
        store
            .update_sprite(0, sprite(0, 0, 0, 0, ctrl::ENABLE))
            .unwrap();
        store
            .update_sprite(1, sprite(0, 0, 1, 0, ctrl::ENABLE))
            .unwrap();
        store.start_frame();

        let mut row = [0u16; 320];
        compose_line(&store, &mut ram, 0, &mut row, 0).unwrap();
        assert_eq!(row[3], 0x103);
    }
}
