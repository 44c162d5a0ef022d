//! Sprite table, palettes and scanline visibility

use heapless::Vec;
use tako_protocol::{SizeClass, PALETTE_COLORS};

use super::{Sprite, MAX_SPRITES, MAX_SPRITES_PER_LINE, PALETTE_COUNT};
use crate::config::{ConfigError, DisplayConfig, MAX_LINES, MAX_WIDTH};
use crate::memory::pattern_address;
use crate::traits::{ExternalMemory, LinePipeline};

/// Sprite store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpriteError {
    /// Sprite index ≥ 128
    InvalidSprite,
    /// Position or line outside the visible frame
    OutOfBounds,
    /// Size-class bits do not name a size
    InvalidSize,
    /// Pattern index past the last pattern slot
    InvalidPattern,
    /// Palette index ≥ 16
    InvalidPalette,
    /// Bitmap shorter than its size class requires
    ShortBitmap,
    /// External memory rejected the write
    Memory,
}

/// One palette of RGB565 colors
pub type Palette = [u16; PALETTE_COLORS];

/// Sprite and asset state consumed by the line pipeline
pub struct SpriteStore {
    sprites: [Sprite; MAX_SPRITES],
    palettes: [Palette; PALETTE_COUNT],
    lines: [Vec<u8, MAX_SPRITES_PER_LINE>; MAX_LINES],
    width: u16,
    height: u16,
}

impl SpriteStore {
    /// Empty store for a panel of the given geometry
    pub fn new(display: &DisplayConfig) -> Result<Self, ConfigError> {
        if display.width == 0
            || display.height == 0
            || display.width > MAX_WIDTH
            || display.height as usize > MAX_LINES
        {
            return Err(ConfigError::InvalidGeometry);
        }

        Ok(Self {
            sprites: [Sprite::DISABLED; MAX_SPRITES],
            palettes: [[0; PALETTE_COLORS]; PALETTE_COUNT],
            lines: core::array::from_fn(|_| Vec::new()),
            width: display.width,
            height: display.height,
        })
    }

    /// Disable every sprite and clear palettes and visibility
    pub fn reset(&mut self) {
        self.sprites = [Sprite::DISABLED; MAX_SPRITES];
        self.palettes = [[0; PALETTE_COLORS]; PALETTE_COUNT];
        for line in self.lines.iter_mut() {
            line.clear();
        }
    }

    /// Replace sprite `index`
    ///
    /// The position must lie inside the visible frame.
    pub fn update_sprite(&mut self, index: u8, sprite: Sprite) -> Result<(), SpriteError> {
        let slot = self
            .sprites
            .get_mut(index as usize)
            .ok_or(SpriteError::InvalidSprite)?;

        if sprite.x >= self.width || sprite.y >= self.height {
            return Err(SpriteError::OutOfBounds);
        }
        if sprite.size().is_none() {
            return Err(SpriteError::InvalidSize);
        }

        *slot = sprite;
        Ok(())
    }

    pub fn enable_sprite(&mut self, index: u8) -> Result<(), SpriteError> {
        let slot = self
            .sprites
            .get_mut(index as usize)
            .ok_or(SpriteError::InvalidSprite)?;
        slot.ctrl |= super::ctrl::ENABLE;
        Ok(())
    }

    pub fn disable_sprite(&mut self, index: u8) -> Result<(), SpriteError> {
        let slot = self
            .sprites
            .get_mut(index as usize)
            .ok_or(SpriteError::InvalidSprite)?;
        slot.ctrl &= !super::ctrl::ENABLE;
        Ok(())
    }

    /// Write a 4bpp pattern bitmap to its fixed-stride slot
    ///
    /// Only `size.pattern_bytes()` bytes are written; the rest of the slot is
    /// left as it was.
    pub fn load_pattern<M: ExternalMemory>(
        &mut self,
        memory: &mut M,
        index: u16,
        bits: &[u8],
        size: SizeClass,
    ) -> Result<(), SpriteError> {
        let address = pattern_address(index).ok_or(SpriteError::InvalidPattern)?;
        let bitmap = bits
            .get(..size.pattern_bytes())
            .ok_or(SpriteError::ShortBitmap)?;

        memory
            .write(address, bitmap)
            .map_err(|_| SpriteError::Memory)
    }

    /// Replace all colors of palette `index`
    pub fn load_palette(&mut self, index: u8, colors: &Palette) -> Result<(), SpriteError> {
        let slot = self
            .palettes
            .get_mut(index as usize)
            .ok_or(SpriteError::InvalidPalette)?;
        *slot = *colors;
        Ok(())
    }

    /// Rebuild the per-line visibility lists from the sprite table
    ///
    /// Sprites are taken in table order; once a line holds
    /// [`MAX_SPRITES_PER_LINE`] entries further sprites on it are dropped,
    /// whatever their priority bit says.
    pub fn start_frame(&mut self) {
        for line in self.lines.iter_mut() {
            line.clear();
        }

        for (index, sprite) in self.sprites.iter().enumerate() {
            if !sprite.is_enabled() {
                continue;
            }
            let Some(size) = sprite.size() else {
                continue;
            };

            let first = sprite.y;
            let last = sprite.y.saturating_add(size.pixels()).min(self.height);
            for line in first..last {
                // Full lines drop the sprite
                let _ = self.lines[line as usize].push(index as u8);
            }
        }
    }

    /// Start the line pipeline on `line`, discarding stale compose results
    pub fn prepare_line<P: LinePipeline>(&self, line: u16, pipeline: &mut P) -> Result<(), SpriteError> {
        if line >= self.height {
            return Err(SpriteError::OutOfBounds);
        }

        pipeline.submit_line(line);
        while pipeline.has_results() {
            let _ = pipeline.take_result();
        }
        Ok(())
    }

    pub fn sprite(&self, index: u8) -> Option<&Sprite> {
        self.sprites.get(index as usize)
    }

    /// Sprite indices visible on `line`, ascending
    pub fn line_sprites(&self, line: u16) -> &[u8] {
        if line >= self.height {
            return &[];
        }
        &self.lines[line as usize]
    }

    pub fn palette(&self, index: u8) -> Option<&Palette> {
        self.palettes.get(index as usize)
    }

    /// Enabled sprites, for the status record
    pub fn enabled_count(&self) -> u8 {
        self.sprites.iter().filter(|s| s.is_enabled()).count() as u8
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::memory::map::{PATTERN_SLOTS, PATTERN_STRIDE, SPRITE_PATTERNS};
    use crate::sprite::ctrl;

    fn store() -> SpriteStore {
        SpriteStore::new(&BoardConfig::DEFAULT.display).unwrap()
    }

    fn enabled(x: u16, y: u16, size_bits: u8) -> Sprite {
        Sprite {
            x,
            y,
            pattern: 0,
            attr: size_bits,
            ctrl: ctrl::ENABLE,
        }
    }

    /// Records writes instead of performing them
    #[derive(Default)]
    struct WriteLog {
        last: Option<(u32, usize)>,
    }

    impl ExternalMemory for WriteLog {
        type Error = ();

        fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), ()> {
            self.last = Some((address, bytes.len()));
            Ok(())
        }

        fn read(&mut self, _address: u32, _buffer: &mut [u8]) -> Result<(), ()> {
            Ok(())
        }
    }

    struct Pipeline {
        submitted: Option<u16>,
        stale: usize,
    }

    impl LinePipeline for Pipeline {
        fn submit_line(&mut self, line: u16) {
            self.submitted = Some(line);
        }

        fn has_results(&self) -> bool {
            self.stale > 0
        }

        fn take_result(&mut self) -> u32 {
            self.stale -= 1;
            0
        }
    }

    #[test]
    fn test_rejects_oversized_geometry() {
        let mut display = BoardConfig::DEFAULT.display;
        display.height = 400;
        assert!(SpriteStore::new(&display).is_err());
    }

    #[test]
    fn test_update_sprite_bounds() {
        let mut s = store();
        assert_eq!(
            s.update_sprite(200, enabled(0, 0, 0)),
            Err(SpriteError::InvalidSprite)
        );
        assert_eq!(
            s.update_sprite(5, enabled(1000, 1000, 0)),
            Err(SpriteError::OutOfBounds)
        );
        assert_eq!(
            s.update_sprite(5, enabled(319, 10, 0)),
            Ok(())
        );
        assert_eq!(
            s.update_sprite(5, enabled(320, 10, 0)),
            Err(SpriteError::OutOfBounds)
        );
        assert_eq!(s.sprite(5).unwrap().x, 319);
    }

    #[test]
    fn test_failed_update_keeps_slot() {
        let mut s = store();
        s.update_sprite(1, enabled(4, 4, 1)).unwrap();
        let _ = s.update_sprite(1, enabled(4, 999, 1));
        assert_eq!(s.sprite(1), Some(&enabled(4, 4, 1)));
    }

    #[test]
    fn test_enable_disable() {
        let mut s = store();
        s.enable_sprite(3).unwrap();
        s.enable_sprite(4).unwrap();
        assert_eq!(s.enabled_count(), 2);
        s.disable_sprite(3).unwrap();
        assert_eq!(s.enabled_count(), 1);
        assert_eq!(s.enable_sprite(128), Err(SpriteError::InvalidSprite));
        assert_eq!(s.disable_sprite(255), Err(SpriteError::InvalidSprite));
    }

    #[test]
    fn test_load_pattern_fixed_stride() {
        let mut s = store();
        let mut mem = WriteLog::default();
        let bits = [0x12u8; 512];

        s.load_pattern(&mut mem, 7, &bits, SizeClass::Size16).unwrap();
        assert_eq!(
            mem.last,
            Some((SPRITE_PATTERNS.base + 7 * PATTERN_STRIDE, 128))
        );
    }

    #[test]
    fn test_load_pattern_rejects() {
        let mut s = store();
        let mut mem = WriteLog::default();

        assert_eq!(
            s.load_pattern(&mut mem, 0, &[0; 127], SizeClass::Size16),
            Err(SpriteError::ShortBitmap)
        );
        assert_eq!(
            s.load_pattern(&mut mem, PATTERN_SLOTS, &[0; 32], SizeClass::Size8),
            Err(SpriteError::InvalidPattern)
        );
        assert_eq!(mem.last, None);
    }

    #[test]
    fn test_load_palette() {
        let mut s = store();
        let colors = [0xF800; PALETTE_COLORS];
        s.load_palette(15, &colors).unwrap();
        assert_eq!(s.palette(15), Some(&colors));
        assert_eq!(s.load_palette(20, &colors), Err(SpriteError::InvalidPalette));
        assert_eq!(s.palette(20), None);
    }

    #[test]
    fn test_start_frame_vertical_extent() {
        let mut s = store();
        s.update_sprite(2, enabled(0, 10, 0)).unwrap(); // 8 lines
        s.update_sprite(9, enabled(0, 14, 1)).unwrap(); // 16 lines
        s.start_frame();

        assert_eq!(s.line_sprites(9), &[] as &[u8]);
        assert_eq!(s.line_sprites(10), &[2]);
        assert_eq!(s.line_sprites(14), &[2, 9]);
        assert_eq!(s.line_sprites(17), &[2, 9]);
        assert_eq!(s.line_sprites(18), &[9]);
        assert_eq!(s.line_sprites(29), &[9]);
        assert_eq!(s.line_sprites(30), &[] as &[u8]);
    }

    #[test]
    fn test_start_frame_clips_bottom() {
        let mut s = store();
        s.update_sprite(0, enabled(0, 230, 3)).unwrap(); // 64 lines from 230
        s.start_frame();
        assert_eq!(s.line_sprites(239), &[0]);
        assert_eq!(s.line_sprites(240), &[] as &[u8]);
    }

    #[test]
    fn test_start_frame_skips_disabled() {
        let mut s = store();
        let mut sprite = enabled(0, 0, 0);
        sprite.ctrl = 0;
        s.update_sprite(0, sprite).unwrap();
        s.start_frame();
        assert!(s.line_sprites(0).is_empty());
    }

    #[test]
    fn test_line_capacity_by_table_order() {
        let mut s = store();
        for i in 0..40u8 {
            let mut sprite = enabled(0, 0, 0);
            if i >= 32 {
                sprite.attr |= crate::sprite::attr::PRIORITY;
            }
            s.update_sprite(i, sprite).unwrap();
        }
        s.start_frame();

        let line = s.line_sprites(0);
        assert_eq!(line.len(), MAX_SPRITES_PER_LINE);
        assert_eq!(line[0], 0);
        assert_eq!(line[31], 31);
    }

    #[test]
    fn test_start_frame_recomputes() {
        let mut s = store();
        s.update_sprite(0, enabled(0, 0, 0)).unwrap();
        s.start_frame();
        s.disable_sprite(0).unwrap();
        s.start_frame();
        assert!(s.line_sprites(0).is_empty());
    }

    #[test]
    fn test_prepare_line_drains_stale() {
        let s = store();
        let mut pipeline = Pipeline {
            submitted: None,
            stale: 3,
        };
        s.prepare_line(12, &mut pipeline).unwrap();
        assert_eq!(pipeline.submitted, Some(12));
        assert_eq!(pipeline.stale, 0);

        assert_eq!(
            s.prepare_line(240, &mut pipeline),
            Err(SpriteError::OutOfBounds)
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = store();
        s.update_sprite(0, enabled(0, 0, 0)).unwrap();
        s.load_palette(0, &[1; PALETTE_COLORS]).unwrap();
        s.start_frame();

        s.reset();
        assert_eq!(s.enabled_count(), 0);
        assert_eq!(s.palette(0), Some(&[0; PALETTE_COLORS]));
        assert!(s.line_sprites(0).is_empty());
    }
}
