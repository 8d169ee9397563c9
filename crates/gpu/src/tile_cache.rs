//! Tiled framebuffer and rasterizer.
//!
//! The 160×120 logical screen is held as resolved panel colors in a 5×5
//! grid of 32×24 tiles. Each tile tracks whether it changed since the last
//! flush (`dirty`) and whether it still holds nothing but the last full
//! clear (`clear`), so repeated clears to the same color cost nothing.
//!
//! All drawing clips silently against the logical resolution.

use platform::WireColor;

use crate::config::{
    RESOLUTION_HEIGHT, RESOLUTION_WIDTH, SMALL_CHAR_ADVANCE, SMALL_CHAR_HEIGHT, SMALL_CHAR_WIDTH,
    TILE_COLUMNS, TILE_HEIGHT, TILE_PIXELS, TILE_ROWS, TILE_WIDTH,
};
use crate::font::FontAtlas;
use crate::palette::Palette;

/// One 32×24 block of the framebuffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Tile {
    pixels: [WireColor; TILE_PIXELS],
    dirty: bool,
    clear: bool,
}

impl Tile {
    const fn new() -> Self {
        Self {
            pixels: [WireColor::BLACK; TILE_PIXELS],
            dirty: true,
            clear: false,
        }
    }

    /// Row-major pixel data, ready for the display sink.
    pub fn pixels(&self) -> &[WireColor; TILE_PIXELS] {
        &self.pixels
    }

    /// Changed since last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Still uniformly filled by the last full clear.
    pub fn is_clear(&self) -> bool {
        self.clear
    }

    /// Pixel at a tile-local offset.
    pub fn pixel(&self, lx: u16, ly: u16) -> Option<WireColor> {
        if lx >= TILE_WIDTH || ly >= TILE_HEIGHT {
            return None;
        }
        self.pixels
            .get(usize::from(ly) * usize::from(TILE_WIDTH) + usize::from(lx))
            .copied()
    }
}

impl core::fmt::Debug for Tile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tile")
            .field("dirty", &self.dirty)
            .field("clear", &self.clear)
            .finish_non_exhaustive()
    }
}

/// Position of a tile in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TileIndex {
    /// Grid row, `0..TILE_ROWS`.
    pub row: usize,
    /// Grid column, `0..TILE_COLUMNS`.
    pub col: usize,
}

impl TileIndex {
    /// Logical-screen coordinate of the tile's top-left pixel.
    #[allow(clippy::cast_possible_truncation)] // row < TILE_ROWS, col < TILE_COLUMNS
    pub fn origin(self) -> (u16, u16) {
        (self.col as u16 * TILE_WIDTH, self.row as u16 * TILE_HEIGHT)
    }
}

/// The framebuffer.
pub struct TileCache {
    tiles: [[Tile; TILE_COLUMNS]; TILE_ROWS],
    last_clear: Option<WireColor>,
}

impl TileCache {
    /// Every tile black, dirty, and not clear, so the first flush paints the whole screen.
    pub const fn new() -> Self {
        const TILE: Tile = Tile::new();
        const ROW: [Tile; TILE_COLUMNS] = [TILE; TILE_COLUMNS];
        Self {
            tiles: [ROW; TILE_ROWS],
            last_clear: None,
        }
    }

    /// Return to the [`TileCache::new`] state without building a second cache.
    pub fn reset(&mut self) {
        for tile in self.tiles.iter_mut().flatten() {
            tile.pixels = [WireColor::BLACK; TILE_PIXELS];
            tile.dirty = true;
            tile.clear = false;
        }
        self.last_clear = None;
    }

    /// Fill the screen with `color`.
    ///
    /// Tiles still holding the previous clear are skipped when `color` is the
    /// color that clear used.
    pub fn clear(&mut self, color: WireColor) {
        let cached = self.last_clear == Some(color);
        for tile in self.tiles.iter_mut().flatten() {
            if tile.clear && cached {
                continue;
            }
            tile.pixels = [color; TILE_PIXELS];
            tile.clear = true;
            tile.dirty = true;
        }
        self.last_clear = Some(color);
    }

    /// Plot one pixel in signed screen space. Returns whether it landed.
    pub fn plot(&mut self, x: i32, y: i32, color: WireColor) -> bool {
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return false;
        };
        if x >= RESOLUTION_WIDTH || y >= RESOLUTION_HEIGHT {
            return false;
        }
        let row = usize::from(y / TILE_HEIGHT);
        let col = usize::from(x / TILE_WIDTH);
        let offset = usize::from(y % TILE_HEIGHT) * usize::from(TILE_WIDTH)
            + usize::from(x % TILE_WIDTH);
        let Some(tile) = self.tiles.get_mut(row).and_then(|r| r.get_mut(col)) else {
            return false;
        };
        let Some(pixel) = tile.pixels.get_mut(offset) else {
            return false;
        };
        *pixel = color;
        tile.dirty = true;
        tile.clear = false;
        true
    }

    /// Plot one pixel; out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: WireColor) {
        self.plot(i32::from(x), i32::from(y), color);
    }

    /// Copy a row-major indexed image with stride `w` to (`x`, `y`).
    ///
    /// Index 0 is transparent. Pixels past the right or bottom edge are
    /// clipped and bytes past the end of `image` are treated as transparent.
    pub fn blit(&mut self, x: u16, y: u16, w: u16, h: u16, image: &[u8], palette: &Palette) {
        for row in 0..h {
            let py = u32::from(y) + u32::from(row);
            if py >= u32::from(RESOLUTION_HEIGHT) {
                break;
            }
            let line = usize::from(row) * usize::from(w);
            for col in 0..w {
                let px = u32::from(x) + u32::from(col);
                if px >= u32::from(RESOLUTION_WIDTH) {
                    break;
                }
                let Some(&index) = image.get(line + usize::from(col)) else {
                    break;
                };
                if index == 0 {
                    continue;
                }
                #[allow(clippy::cast_possible_wrap)] // both < RESOLUTION_WIDTH/HEIGHT
                self.plot(px as i32, py as i32, palette.get(index));
            }
        }
    }

    /// Rasterize `text` with its first glyph cell at (`x`, `y`).
    ///
    /// Byte `i` is drawn at `x + i * 6`; bytes above 127 draw nothing but
    /// still take up their cell.
    pub fn print_small(
        &mut self,
        x: i32,
        y: i32,
        text: &[u8],
        atlas: &FontAtlas,
        color: WireColor,
    ) {
        let mut cx = x;
        for &code in text {
            if code <= 127 {
                for gy in 0..SMALL_CHAR_HEIGHT {
                    for gx in 0..SMALL_CHAR_WIDTH {
                        if atlas.is_lit(code, gx, gy) {
                            self.plot(cx + i32::from(gx), y + i32::from(gy), color);
                        }
                    }
                }
            }
            cx = cx.saturating_add(i32::from(SMALL_CHAR_ADVANCE));
        }
    }

    /// Borrow one tile.
    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles.get(index.row).and_then(|r| r.get(index.col))
    }

    /// Pixel at a logical-screen coordinate.
    pub fn pixel(&self, x: u16, y: u16) -> Option<WireColor> {
        if x >= RESOLUTION_WIDTH || y >= RESOLUTION_HEIGHT {
            return None;
        }
        let index = TileIndex {
            row: usize::from(y / TILE_HEIGHT),
            col: usize::from(x / TILE_WIDTH),
        };
        self.tile(index)?.pixel(x % TILE_WIDTH, y % TILE_HEIGHT)
    }

    /// Grid positions of every dirty tile, row by row.
    pub fn dirty_tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.tiles.iter().enumerate().flat_map(|(row, tiles)| {
            tiles
                .iter()
                .enumerate()
                .filter(|(_, tile)| tile.dirty)
                .map(move |(col, _)| TileIndex { row, col })
        })
    }

    /// Number of dirty tiles.
    pub fn dirty_count(&self) -> usize {
        self.tiles.iter().flatten().filter(|t| t.dirty).count()
    }

    /// Record that a tile reached the display.
    pub fn mark_flushed(&mut self, index: TileIndex) {
        if let Some(tile) = self.tiles.get_mut(index.row).and_then(|r| r.get_mut(index.col)) {
            tile.dirty = false;
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RED: WireColor = WireColor::from_raw(0xF800);
    const BLUE: WireColor = WireColor::from_raw(0x001F);

    fn flush_all(cache: &mut TileCache) {
        let dirty: heapless::Vec<TileIndex, 25> = cache.dirty_tiles().collect();
        for index in dirty {
            cache.mark_flushed(index);
        }
    }

    #[test]
    fn test_new_cache_is_all_dirty() {
        let cache = TileCache::new();
        assert_eq!(cache.dirty_count(), TILE_ROWS * TILE_COLUMNS);
        assert_eq!(cache.pixel(0, 0), Some(WireColor::BLACK));
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut cache = TileCache::new();
        cache.clear(RED);
        flush_all(&mut cache);
        assert_eq!(cache.dirty_count(), 0);

        cache.reset();

        assert_eq!(cache.dirty_count(), TILE_ROWS * TILE_COLUMNS);
        assert_eq!(cache.pixel(159, 119), Some(WireColor::BLACK));
        let tile = cache.tile(TileIndex { row: 0, col: 0 }).unwrap();
        assert!(!tile.is_clear());
        // The clear cache is forgotten too: the same color clears again.
        cache.clear(RED);
        assert_eq!(cache.pixel(0, 0), Some(RED));
    }

    #[test]
    fn test_clear_fills_every_pixel() {
        let mut cache = TileCache::new();
        cache.clear(RED);
        for (x, y) in [(0, 0), (159, 119), (80, 60), (31, 23), (32, 24)] {
            assert_eq!(cache.pixel(x, y), Some(RED));
        }
        let tile = cache.tile(TileIndex { row: 4, col: 4 }).unwrap();
        assert!(tile.is_clear());
        assert!(tile.is_dirty());
    }

    #[test]
    fn test_repeated_clear_is_cached() {
        let mut cache = TileCache::new();
        cache.clear(RED);
        flush_all(&mut cache);
        cache.clear(RED);
        assert_eq!(cache.dirty_count(), 0);
    }

    #[test]
    fn test_clear_after_draw_redraws_only_touched_tiles() {
        let mut cache = TileCache::new();
        cache.clear(RED);
        flush_all(&mut cache);
        cache.set_pixel(40, 30, BLUE);
        flush_all(&mut cache);

        cache.clear(RED);
        let dirty: heapless::Vec<TileIndex, 25> = cache.dirty_tiles().collect();
        assert_eq!(dirty.as_slice(), &[TileIndex { row: 1, col: 1 }]);
        assert_eq!(cache.pixel(40, 30), Some(RED));
    }

    #[test]
    fn test_clear_with_new_color_redraws_everything() {
        let mut cache = TileCache::new();
        cache.clear(RED);
        flush_all(&mut cache);
        cache.clear(BLUE);
        assert_eq!(cache.dirty_count(), 25);
        assert_eq!(cache.pixel(100, 100), Some(BLUE));
    }

    #[test]
    fn test_set_pixel_marks_owning_tile() {
        let mut cache = TileCache::new();
        cache.clear(RED);
        flush_all(&mut cache);

        cache.set_pixel(70, 50, BLUE);
        let index = TileIndex { row: 2, col: 2 };
        let tile = cache.tile(index).unwrap();
        assert!(tile.is_dirty());
        assert!(!tile.is_clear());
        assert_eq!(tile.pixel(70 - 64, 50 - 48), Some(BLUE));
        assert_eq!(cache.dirty_count(), 1);
    }

    #[test]
    fn test_out_of_range_pixels_are_ignored() {
        let mut cache = TileCache::new();
        flush_all(&mut cache);
        cache.set_pixel(160, 0, RED);
        cache.set_pixel(0, 120, RED);
        assert!(!cache.plot(-1, 5, RED));
        assert_eq!(cache.dirty_count(), 0);
    }

    #[test]
    fn test_blit_skips_transparent_and_clips() {
        let palette = Palette::default_ramp();
        let mut cache = TileCache::new();
        cache.clear(WireColor::BLACK);
        flush_all(&mut cache);

        // 3×2 image straddling the right edge.
        let image = [0xFF, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        cache.blit(158, 0, 3, 2, &image, &palette);

        let white = palette.get(0xFF);
        assert_eq!(cache.pixel(158, 0), Some(white));
        assert_eq!(cache.pixel(159, 0), Some(WireColor::BLACK));
        assert_eq!(cache.pixel(158, 1), Some(white));
        assert_eq!(cache.pixel(159, 1), Some(white));
        assert_eq!(cache.dirty_count(), 1);
    }

    #[test]
    fn test_short_image_stops_at_end_of_data() {
        let palette = Palette::default_ramp();
        let mut cache = TileCache::new();
        cache.clear(WireColor::BLACK);
        cache.blit(0, 0, 4, 4, &[1, 1], &palette);
        assert_eq!(cache.pixel(1, 0), Some(palette.get(1)));
        assert_eq!(cache.pixel(2, 0), Some(WireColor::BLACK));
        assert_eq!(cache.pixel(0, 1), Some(WireColor::BLACK));
    }

    #[test]
    fn test_print_small_advances_six_pixels() {
        let atlas = FontAtlas::from_pixels(&[1; crate::font::ATLAS_PIXELS]);
        let mut cache = TileCache::new();
        cache.clear(WireColor::BLACK);

        cache.print_small(0, 0, &[b'a', 200, b'b'], &atlas, RED);
        // First cell lit, spacing column dark.
        assert_eq!(cache.pixel(4, 6), Some(RED));
        assert_eq!(cache.pixel(5, 0), Some(WireColor::BLACK));
        // Byte above 127 leaves its cell empty.
        assert_eq!(cache.pixel(6, 0), Some(WireColor::BLACK));
        // Third byte lands at x = 12.
        assert_eq!(cache.pixel(12, 0), Some(RED));
    }

    #[test]
    fn test_print_small_clips_at_edges() {
        let atlas = FontAtlas::from_pixels(&[1; crate::font::ATLAS_PIXELS]);
        let mut cache = TileCache::new();
        cache.clear(WireColor::BLACK);
        cache.print_small(-3, 116, b"x", &atlas, RED);
        assert_eq!(cache.pixel(0, 116), Some(RED));
        assert_eq!(cache.pixel(1, 119), Some(RED));
        assert_eq!(cache.pixel(2, 119), Some(WireColor::BLACK));
    }

    #[test]
    fn test_tile_origin() {
        assert_eq!(TileIndex { row: 2, col: 3 }.origin(), (96, 48));
    }
}
