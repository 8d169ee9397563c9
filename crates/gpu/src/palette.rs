//! Palette engine.
//!
//! Seventeen 256-entry tables map an 8-bit color index to a panel color.
//! Palette 0 is a 3-3-2 ramp; every other palette is palette 0 run through
//! one fixed transform. The bank is built once when the renderer starts and
//! only the active index changes afterwards.
//!
//! Transforms work in floating point RGB with each channel in `[0, 1]`
//! and quantize back to RGB565 by clamping and truncating.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::RgbColor;
use platform::WireColor;

use crate::config::{PALETTE_COUNT, PALETTE_SIZE};

// ---------------------------------------------------------------------------
// Float color
// ---------------------------------------------------------------------------

/// Linear RGB color, channels nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Rgb {
    /// Build from channel values.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Expand a panel color to float channels.
    pub fn from_wire(color: WireColor) -> Self {
        let c: Rgb565 = color.into();
        Self {
            r: f32::from(c.r()) / 31.0,
            g: f32::from(c.g()) / 63.0,
            b: f32::from(c.b()) / 31.0,
        }
    }

    /// Quantize to a panel color. Channels are clamped to `[0, 1]` first.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to [0, 31|63]
    pub fn to_wire(self) -> WireColor {
        let r = (self.r.clamp(0.0, 1.0) * 31.0) as u8;
        let g = (self.g.clamp(0.0, 1.0) * 63.0) as u8;
        let b = (self.b.clamp(0.0, 1.0) * 31.0) as u8;
        Rgb565::new(r, g, b).into()
    }

    /// Mean of the three channels.
    pub fn gray(self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Palette construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaletteError {
    /// A gradient needs at least two stops (one segment).
    NoGradeStops,
}

impl core::fmt::Display for PaletteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoGradeStops => write!(f, "color grade needs at least two stops"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PaletteError {}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// One of the fixed transforms that derive a palette from palette 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Leave the palette as is.
    Identity,
    /// Blend every entry toward `color` by `amount`.
    Mix {
        /// Target color
        color: Rgb,
        /// Blend factor in `[0, 1]`
        amount: f32,
    },
    /// Scale each entry's distance from its gray value.
    Saturate(f32),
    /// `1 - channel` for every channel.
    Invert,
    /// Re-key entries by brightness onto a piecewise-linear ramp.
    Grade(&'static [Rgb]),
}

/// A 256-entry color lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: [WireColor; PALETTE_SIZE],
}

impl Palette {
    /// Red levels for the three red bits of an index.
    const REDS: [u8; 8] = [0, 4, 8, 12, 16, 20, 24, 31];
    /// Green levels for the three green bits of an index.
    const GREENS: [u8; 8] = [0, 8, 16, 24, 32, 40, 48, 63];
    /// Blue levels for the two blue bits of an index.
    const BLUES: [u8; 4] = [0, 8, 16, 31];

    /// The default 8×8×4 ramp.
    ///
    /// Index bits are `RRRGGGBB`; each field picks a perceptually stepped
    /// level at the panel's 5/6/5 channel depth.
    pub fn default_ramp() -> Self {
        let mut colors = [WireColor::BLACK; PALETTE_SIZE];
        for (index, slot) in colors.iter_mut().enumerate() {
            let r = Self::REDS[(index >> 5) & 0b111];
            let g = Self::GREENS[(index >> 2) & 0b111];
            let b = Self::BLUES[index & 0b11];
            *slot = Rgb565::new(r, g, b).into();
        }
        Self { colors }
    }

    /// Resolve a color index.
    pub fn get(&self, index: u8) -> WireColor {
        self.colors[usize::from(index)]
    }

    /// All entries, in index order.
    pub fn colors(&self) -> &[WireColor; PALETTE_SIZE] {
        &self.colors
    }

    /// Run `transform` over this palette in place.
    pub fn apply(&mut self, transform: Transform) -> Result<(), PaletteError> {
        match transform {
            Transform::Identity => {}
            Transform::Mix { color, amount } => self.mix(color, amount),
            Transform::Saturate(amount) => self.saturate(amount),
            Transform::Invert => self.invert(),
            Transform::Grade(stops) => self.color_grade(stops)?,
        }
        Ok(())
    }

    fn map(&mut self, mut f: impl FnMut(Rgb) -> Rgb) {
        for slot in &mut self.colors {
            *slot = f(Rgb::from_wire(*slot)).to_wire();
        }
    }

    /// Linear blend of every entry toward `color`: `src·(1−amount) + color·amount`.
    pub fn mix(&mut self, color: Rgb, amount: f32) {
        let keep = 1.0 - amount;
        self.map(|c| Rgb {
            r: c.r * keep + color.r * amount,
            g: c.g * keep + color.g * amount,
            b: c.b * keep + color.b * amount,
        });
    }

    /// Push channels away from (`amount > 1`) or toward (`amount < 1`) each
    /// entry's gray value.
    ///
    /// A channel is never moved across the gray value, so the ordering of
    /// channels relative to gray is preserved.
    pub fn saturate(&mut self, amount: f32) {
        let delta = amount - 1.0;
        self.map(|c| {
            let gray = c.gray();
            let push = |v: f32| {
                if v < gray {
                    (v - v * delta).min(gray)
                } else {
                    (v + v * delta).max(gray)
                }
            };
            Rgb {
                r: push(c.r),
                g: push(c.g),
                b: push(c.b),
            }
        });
    }

    /// `1 − channel` for every entry.
    pub fn invert(&mut self) {
        self.map(|c| Rgb {
            r: 1.0 - c.r,
            g: 1.0 - c.g,
            b: 1.0 - c.b,
        });
    }

    /// Replace every entry with the point of a gradient ramp matching its
    /// brightness.
    ///
    /// The ramp has `stops.len() - 1` segments of `256 / segments` steps
    /// each; when 256 does not divide evenly the tail holds the final stop.
    /// When two consecutive entries share a gray value the second is scaled
    /// by 1.1 so they do not collapse onto one ramp slot.
    ///
    /// # Errors
    ///
    /// [`PaletteError::NoGradeStops`] if fewer than two stops are given.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // index clamped to [0, 255]
    #[allow(clippy::cast_precision_loss)] // per_segment <= 256
    #[allow(clippy::float_cmp)] // exact repeat detection on quantized inputs
    pub fn color_grade(&mut self, stops: &[Rgb]) -> Result<(), PaletteError> {
        let segments = stops.len().saturating_sub(1);
        let last = match stops.last() {
            Some(&last) if segments > 0 => last,
            _ => return Err(PaletteError::NoGradeStops),
        };

        let per_segment = PALETTE_SIZE / segments;
        let mut ramp = [last; PALETTE_SIZE];
        let mut slots = ramp.iter_mut();
        for pair in stops.windows(2) {
            let &[from, to] = pair else { continue };
            let steps = per_segment as f32;
            let step = Rgb {
                r: (to.r - from.r) / steps,
                g: (to.g - from.g) / steps,
                b: (to.b - from.b) / steps,
            };
            for (i, slot) in (&mut slots).take(per_segment).enumerate() {
                let i = i as f32;
                *slot = Rgb {
                    r: from.r + i * step.r,
                    g: from.g + i * step.g,
                    b: from.b + i * step.b,
                };
            }
        }

        let mut previous_gray = 0.0_f32;
        for slot in &mut self.colors {
            let mut gray = Rgb::from_wire(*slot).gray();
            if gray == previous_gray {
                gray *= 1.1;
            }
            previous_gray = gray;
            let index = (gray * 255.0).clamp(0.0, 255.0) as usize;
            *slot = ramp[index].to_wire();
        }
        Ok(())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_ramp()
    }
}

// ---------------------------------------------------------------------------
// Palette identities
// ---------------------------------------------------------------------------

/// The seventeen built-in palettes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaletteId {
    /// 3-3-2 ramp
    Default = 0,
    /// Channels pushed 60% further from gray
    Saturated = 1,
    /// Channels pulled 20% toward gray
    Bleached = 2,
    /// Negative
    Inverted = 3,
    /// 30% toward white
    Lighter = 4,
    /// 30% toward black
    Darker = 5,
    /// Dark red to pale pink
    Warm = 6,
    /// Dark blue to pale blue
    Cold = 7,
    /// Black to white
    Grayscale = 8,
    /// Red tint
    AllRed = 9,
    /// Orange tint
    AllOrange = 10,
    /// Yellow tint
    AllYellow = 11,
    /// Green tint
    AllGreen = 12,
    /// Teal tint
    AllTeal = 13,
    /// Blue tint
    AllBlue = 14,
    /// Purple tint
    AllPurple = 15,
    /// Pink tint
    AllPink = 16,
}

const WARM: [Rgb; 5] = [
    Rgb::new(0.4, 0.0, 0.0),
    Rgb::new(0.8, 0.2, 0.0),
    Rgb::new(0.8, 0.4, 0.2),
    Rgb::new(0.8, 0.8, 0.4),
    Rgb::new(1.0, 0.8, 0.8),
];
const COLD: [Rgb; 5] = [
    Rgb::new(0.0, 0.0, 0.4),
    Rgb::new(0.0, 0.2, 0.8),
    Rgb::new(0.2, 0.4, 0.8),
    Rgb::new(0.4, 0.8, 0.8),
    Rgb::new(0.8, 0.8, 1.0),
];
const GRAYSCALE: [Rgb; 3] = [
    Rgb::new(0.0, 0.0, 0.0),
    Rgb::new(0.5, 0.5, 0.5),
    Rgb::new(1.0, 1.0, 1.0),
];
const ALL_RED: [Rgb; 3] = [
    Rgb::new(0.4, 0.0, 0.0),
    Rgb::new(0.8, 0.2, 0.2),
    Rgb::new(1.0, 0.8, 0.8),
];
const ALL_ORANGE: [Rgb; 3] = [
    Rgb::new(0.4, 0.2, 0.0),
    Rgb::new(0.8, 0.4, 0.2),
    Rgb::new(1.0, 0.9, 0.8),
];
const ALL_YELLOW: [Rgb; 3] = [
    Rgb::new(0.4, 0.4, 0.0),
    Rgb::new(0.8, 0.8, 0.2),
    Rgb::new(1.0, 1.0, 0.8),
];
const ALL_GREEN: [Rgb; 3] = [
    Rgb::new(0.0, 0.4, 0.0),
    Rgb::new(0.2, 0.8, 0.2),
    Rgb::new(0.8, 1.0, 0.8),
];
const ALL_TEAL: [Rgb; 3] = [
    Rgb::new(0.0, 0.4, 0.4),
    Rgb::new(0.2, 0.8, 0.8),
    Rgb::new(0.8, 1.0, 1.0),
];
const ALL_BLUE: [Rgb; 3] = [
    Rgb::new(0.0, 0.0, 0.4),
    Rgb::new(0.2, 0.2, 0.8),
    Rgb::new(0.8, 0.8, 1.0),
];
const ALL_PURPLE: [Rgb; 3] = [
    Rgb::new(0.4, 0.0, 0.4),
    Rgb::new(0.8, 0.2, 0.8),
    Rgb::new(1.0, 0.8, 1.0),
];
const ALL_PINK: [Rgb; 3] = [
    Rgb::new(0.4, 0.2, 0.2),
    Rgb::new(0.8, 0.4, 0.4),
    Rgb::new(1.0, 0.8, 0.8),
];

impl PaletteId {
    /// Every palette, in index order.
    pub const ALL: [PaletteId; PALETTE_COUNT] = [
        PaletteId::Default,
        PaletteId::Saturated,
        PaletteId::Bleached,
        PaletteId::Inverted,
        PaletteId::Lighter,
        PaletteId::Darker,
        PaletteId::Warm,
        PaletteId::Cold,
        PaletteId::Grayscale,
        PaletteId::AllRed,
        PaletteId::AllOrange,
        PaletteId::AllYellow,
        PaletteId::AllGreen,
        PaletteId::AllTeal,
        PaletteId::AllBlue,
        PaletteId::AllPurple,
        PaletteId::AllPink,
    ];

    /// Look up a palette by index; `None` past the end of the bank.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Position in the bank.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The transform that derives this palette from palette 0.
    pub const fn transform(self) -> Transform {
        match self {
            Self::Default => Transform::Identity,
            Self::Saturated => Transform::Saturate(1.6),
            Self::Bleached => Transform::Saturate(0.8),
            Self::Inverted => Transform::Invert,
            Self::Lighter => Transform::Mix {
                color: Rgb::new(1.0, 1.0, 1.0),
                amount: 0.3,
            },
            Self::Darker => Transform::Mix {
                color: Rgb::new(0.0, 0.0, 0.0),
                amount: 0.3,
            },
            Self::Warm => Transform::Grade(&WARM),
            Self::Cold => Transform::Grade(&COLD),
            Self::Grayscale => Transform::Grade(&GRAYSCALE),
            Self::AllRed => Transform::Grade(&ALL_RED),
            Self::AllOrange => Transform::Grade(&ALL_ORANGE),
            Self::AllYellow => Transform::Grade(&ALL_YELLOW),
            Self::AllGreen => Transform::Grade(&ALL_GREEN),
            Self::AllTeal => Transform::Grade(&ALL_TEAL),
            Self::AllBlue => Transform::Grade(&ALL_BLUE),
            Self::AllPurple => Transform::Grade(&ALL_PURPLE),
            Self::AllPink => Transform::Grade(&ALL_PINK),
        }
    }
}

impl From<PaletteId> for u8 {
    fn from(id: PaletteId) -> Self {
        id as u8
    }
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

/// All seventeen palettes, built once.
pub struct PaletteBank {
    palettes: [Palette; PALETTE_COUNT],
}

impl PaletteBank {
    /// Every palette all black. Call [`PaletteBank::rebuild`] before use.
    pub const fn new() -> Self {
        const BLANK: Palette = Palette {
            colors: [WireColor::BLACK; PALETTE_SIZE],
        };
        Self {
            palettes: [BLANK; PALETTE_COUNT],
        }
    }

    /// Build palette 0 and derive the rest from it.
    ///
    /// Returns the bank by value; on the device use
    /// [`PaletteBank::rebuild`] on a bank that already lives in a `static`.
    pub fn build() -> Result<Self, PaletteError> {
        let mut bank = Self::new();
        bank.rebuild()?;
        Ok(bank)
    }

    /// Regenerate all seventeen palettes in place, one at a time.
    pub fn rebuild(&mut self) -> Result<(), PaletteError> {
        for (palette, id) in self.palettes.iter_mut().zip(PaletteId::ALL) {
            *palette = Palette::default_ramp();
            palette.apply(id.transform())?;
        }
        Ok(())
    }

    /// Borrow one palette.
    pub fn get(&self, id: PaletteId) -> &Palette {
        &self.palettes[id.index()]
    }

    /// Resolve `index` through palette `id`.
    pub fn resolve(&self, id: PaletteId, index: u8) -> WireColor {
        self.get(id).get(index)
    }
}
