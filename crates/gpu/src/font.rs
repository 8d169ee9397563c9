//! Small bitmap font atlas.
//!
//! An 80×56 one-bit image holding 128 glyph cells of 5×7 pixels, sixteen
//! cells per row, laid out row-major by code point. Cell `c` starts at
//! `((c % 16) * 5, (c / 16) * 7)`.
//!
//! The built-in atlas is rasterized once from embedded-graphics'
//! `FONT_5X7` (printable ASCII). Any other 80×56 image can be loaded with
//! [`FontAtlas::from_pixels`].

use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::config::{SMALL_CHAR_HEIGHT, SMALL_CHAR_WIDTH};

/// Glyph cells per atlas row.
pub const ATLAS_COLUMNS: u16 = 16;
/// Atlas width in pixels.
pub const ATLAS_WIDTH: u16 = ATLAS_COLUMNS * SMALL_CHAR_WIDTH;
/// Atlas height in pixels.
pub const ATLAS_HEIGHT: u16 = 8 * SMALL_CHAR_HEIGHT;
/// Atlas size in pixels.
pub const ATLAS_PIXELS: usize = ATLAS_WIDTH as usize * ATLAS_HEIGHT as usize;

const ATLAS_BYTES: usize = ATLAS_PIXELS.div_ceil(8);

/// One-bit glyph atlas, MSB-first.
#[derive(Clone, PartialEq, Eq)]
pub struct FontAtlas {
    bits: [u8; ATLAS_BYTES],
}

impl FontAtlas {
    /// An atlas with no lit pixels.
    pub const fn blank() -> Self {
        Self {
            bits: [0; ATLAS_BYTES],
        }
    }

    /// Printable ASCII (0x20..=0x7E) rendered with `FONT_5X7`; other cells blank.
    pub fn builtin() -> Self {
        let mut atlas = Self::blank();
        let style = MonoTextStyle::new(&FONT_5X7, BinaryColor::On);
        let mut buf = [0u8; 4];
        for code in 0x20u8..0x7F {
            let glyph = char::from(code).encode_utf8(&mut buf);
            let origin = Self::cell_origin(code);
            if let Err(never) =
                Text::with_baseline(glyph, origin, style, Baseline::Top).draw(&mut atlas)
            {
                match never {}
            }
        }
        atlas
    }

    /// Load an 80×56 image, row-major, non-zero = lit.
    pub fn from_pixels(pixels: &[u8; ATLAS_PIXELS]) -> Self {
        let mut atlas = Self::blank();
        for (i, &p) in pixels.iter().enumerate() {
            if p != 0 {
                atlas.set_bit(i);
            }
        }
        atlas
    }

    fn cell_origin(code: u8) -> Point {
        let code = u16::from(code);
        Point::new(
            i32::from((code % ATLAS_COLUMNS) * SMALL_CHAR_WIDTH),
            i32::from((code / ATLAS_COLUMNS) * SMALL_CHAR_HEIGHT),
        )
    }

    fn set_bit(&mut self, index: usize) {
        if let Some(byte) = self.bits.get_mut(index / 8) {
            *byte |= 0x80 >> (index % 8);
        }
    }

    fn bit(&self, index: usize) -> bool {
        self.bits
            .get(index / 8)
            .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
    }

    /// Whether pixel (`gx`, `gy`) of the glyph for `code` is lit.
    ///
    /// Codes above 127 and offsets outside the 5×7 cell are never lit.
    pub fn is_lit(&self, code: u8, gx: u16, gy: u16) -> bool {
        if code > 127 || gx >= SMALL_CHAR_WIDTH || gy >= SMALL_CHAR_HEIGHT {
            return false;
        }
        let code = u16::from(code);
        let px = (code % ATLAS_COLUMNS) * SMALL_CHAR_WIDTH + gx;
        let py = (code / ATLAS_COLUMNS) * SMALL_CHAR_HEIGHT + gy;
        self.bit(usize::from(py) * usize::from(ATLAS_WIDTH) + usize::from(px))
    }
}

impl Default for FontAtlas {
    fn default() -> Self {
        Self::builtin()
    }
}

impl core::fmt::Debug for FontAtlas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontAtlas")
            .field("width", &ATLAS_WIDTH)
            .field("height", &ATLAS_HEIGHT)
            .finish_non_exhaustive()
    }
}

impl DrawTarget for FontAtlas {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) else {
                continue;
            };
            if x >= ATLAS_WIDTH || y >= ATLAS_HEIGHT || color == BinaryColor::Off {
                continue;
            }
            self.set_bit(usize::from(y) * usize::from(ATLAS_WIDTH) + usize::from(x));
        }
        Ok(())
    }
}

impl OriginDimensions for FontAtlas {
    fn size(&self) -> Size {
        Size::new(u32::from(ATLAS_WIDTH), u32::from(ATLAS_HEIGHT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_count(atlas: &FontAtlas, code: u8) -> usize {
        (0..SMALL_CHAR_HEIGHT)
            .flat_map(|gy| (0..SMALL_CHAR_WIDTH).map(move |gx| (gx, gy)))
            .filter(|&(gx, gy)| atlas.is_lit(code, gx, gy))
            .count()
    }

    #[test]
    fn test_atlas_geometry() {
        assert_eq!(ATLAS_WIDTH, 80);
        assert_eq!(ATLAS_HEIGHT, 56);
        assert_eq!(FontAtlas::blank().size(), Size::new(80, 56));
    }

    #[test]
    fn test_builtin_has_printable_glyphs() {
        let atlas = FontAtlas::builtin();
        assert_eq!(lit_count(&atlas, b' '), 0);
        for code in [b'A', b'0', b'z', b'#'] {
            assert!(lit_count(&atlas, code) > 0, "glyph {code:#x} is empty");
        }
        // Control codes have no glyph.
        assert_eq!(lit_count(&atlas, 0x01), 0);
    }

    #[test]
    fn test_glyphs_stay_in_their_cell() {
        // 'A' and 'B' are neighbours; drawing one must not light the other.
        let mut atlas = FontAtlas::blank();
        let style = MonoTextStyle::new(&FONT_5X7, BinaryColor::On);
        Text::with_baseline("A", FontAtlas::cell_origin(b'A'), style, Baseline::Top)
            .draw(&mut atlas)
            .ok();
        assert!(lit_count(&atlas, b'A') > 0);
        assert_eq!(lit_count(&atlas, b'B'), 0);
        assert_eq!(lit_count(&atlas, b'@'), 0);
    }

    #[test]
    fn test_from_pixels_maps_cells() {
        let mut pixels = [0u8; ATLAS_PIXELS];
        // Top-left pixel of code 17 lives at (5, 7).
        pixels[7 * 80 + 5] = 1;
        let atlas = FontAtlas::from_pixels(&pixels);
        assert!(atlas.is_lit(17, 0, 0));
        assert!(!atlas.is_lit(17, 1, 0));
        assert!(!atlas.is_lit(16, 0, 0));
    }

    #[test]
    fn test_out_of_cell_queries_are_unlit() {
        let atlas = FontAtlas::from_pixels(&[1; ATLAS_PIXELS]);
        assert!(atlas.is_lit(b'A', 4, 6));
        assert!(!atlas.is_lit(b'A', 5, 0));
        assert!(!atlas.is_lit(b'A', 0, 7));
        assert!(!atlas.is_lit(200, 0, 0));
    }
}
