//! GPU geometry and capacity constants.
//!
//! The logical screen is 160×120 indexed pixels, centred on the 320×240
//! panel and cached as a 5×5 grid of 32×24 tiles.

use platform::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Logical resolution width in pixels.
pub const RESOLUTION_WIDTH: u16 = 160;

/// Logical resolution height in pixels.
pub const RESOLUTION_HEIGHT: u16 = 120;

/// Width of one framebuffer tile.
pub const TILE_WIDTH: u16 = 32;

/// Height of one framebuffer tile.
pub const TILE_HEIGHT: u16 = 24;

/// Pixels held by one tile.
pub const TILE_PIXELS: usize = TILE_WIDTH as usize * TILE_HEIGHT as usize;

/// Tiles per framebuffer row.
pub const TILE_COLUMNS: usize = (RESOLUTION_WIDTH / TILE_WIDTH) as usize;

/// Tile rows in the framebuffer.
pub const TILE_ROWS: usize = (RESOLUTION_HEIGHT / TILE_HEIGHT) as usize;

/// Panel column of the framebuffer's left edge.
pub const FRAMEBUFFER_X: u16 = (DISPLAY_WIDTH - RESOLUTION_WIDTH) / 2;

/// Panel row of the framebuffer's top edge.
pub const FRAMEBUFFER_Y: u16 = (DISPLAY_HEIGHT - RESOLUTION_HEIGHT) / 2;

/// Number of commands the channel holds before `push` blocks.
pub const COMMAND_QUEUE_DEPTH: usize = 500;

/// Number of `print_small` calls allowed between two flushed frames.
pub const TEXT_SLOT_CAPACITY: usize = 16;

/// Maximum formatted length of one `print_small` string, in bytes.
pub const TEXT_SLOT_LENGTH: usize = 64;

/// Glyph cell width of the small font.
pub const SMALL_CHAR_WIDTH: u16 = 5;

/// Glyph cell height of the small font.
pub const SMALL_CHAR_HEIGHT: u16 = 7;

/// Horizontal advance per character (glyph plus one pixel of spacing).
pub const SMALL_CHAR_ADVANCE: u16 = SMALL_CHAR_WIDTH + 1;

/// Right-alignment sentinel for `print_small`.
///
/// Passing `PRINT_RIGHT - m` as the x coordinate places the end of the text
/// `m` pixels from the right edge of the screen.
pub const PRINT_RIGHT: u16 = 5000;

/// Smallest x coordinate interpreted as right-aligned.
pub const PRINT_RIGHT_START: u16 = PRINT_RIGHT - 1000;

/// Number of palettes in the bank.
pub const PALETTE_COUNT: usize = 17;

/// Entries per palette.
pub const PALETTE_SIZE: usize = 256;

const _: () = assert!(RESOLUTION_WIDTH % TILE_WIDTH == 0);
const _: () = assert!(RESOLUTION_HEIGHT % TILE_HEIGHT == 0);
const _: () = assert!(TEXT_SLOT_CAPACITY <= u8::MAX as usize);

/// Runtime configuration for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpuConfig {
    /// Upper bound on flushed frames per second.
    pub max_fps: u8,
    /// Background color index at power-on.
    pub background: u8,
    /// Foreground color index at power-on.
    pub foreground: u8,
}

impl GpuConfig {
    /// Minimum time between two flushed frames, in microseconds.
    ///
    /// A `max_fps` of zero is treated as one frame per second.
    pub fn min_frame_interval_us(&self) -> u64 {
        1_000_000 / u64::from(self.max_fps.max(1))
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            max_fps: 30,
            background: 0,
            foreground: 255,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_covers_resolution() {
        assert_eq!(TILE_COLUMNS, 5);
        assert_eq!(TILE_ROWS, 5);
        assert_eq!(TILE_PIXELS, 768);
    }

    #[test]
    fn test_framebuffer_is_centred_on_panel() {
        assert_eq!(FRAMEBUFFER_X, 80);
        assert_eq!(FRAMEBUFFER_Y, 60);
    }

    #[test]
    fn test_min_frame_interval() {
        let cfg = GpuConfig::default();
        assert_eq!(cfg.min_frame_interval_us(), 33_333);
        let zero = GpuConfig { max_fps: 0, ..cfg };
        assert_eq!(zero.min_frame_interval_us(), 1_000_000);
    }
}
