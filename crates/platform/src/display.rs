//! Display abstraction layer
//!
//! The GPU engine never talks to a panel directly: it resolves palette
//! indices to [`WireColor`] values and hands whole tiles to a
//! [`DisplaySink`].

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};

/// A 16-bit RGB565 color stored in panel wire order.
///
/// The panel expects the high byte of each RGB565 value first. Storing the
/// value pre-swapped lets a tile buffer be streamed to the bus as raw memory.
/// [`WireColor::to_bytes`] yields the bytes in transmit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct WireColor(u16);

impl WireColor {
    /// All channels off.
    pub const BLACK: Self = Self::from_raw(0x0000);

    /// All channels saturated.
    pub const WHITE: Self = Self::from_raw(0xFFFF);

    /// Build from a native RGB565 value (`RRRRRGGG GGGBBBBB`).
    pub const fn from_raw(native: u16) -> Self {
        Self(native.to_be())
    }

    /// Build from a value that is already in wire order.
    pub const fn from_wire(wire: u16) -> Self {
        Self(wire)
    }

    /// Native RGB565 value.
    pub const fn to_raw(self) -> u16 {
        u16::from_be(self.0)
    }

    /// Value in wire order, as it sits in a tile buffer.
    pub const fn wire(self) -> u16 {
        self.0
    }

    /// Bytes in the order they are clocked out to the panel.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_ne_bytes()
    }

    /// Convert from an embedded-graphics color.
    pub fn from_rgb565(color: Rgb565) -> Self {
        Self::from_raw(color.into_storage())
    }

    /// Convert to an embedded-graphics color.
    pub fn to_rgb565(self) -> Rgb565 {
        Rgb565::from(RawU16::new(self.to_raw()))
    }
}

impl From<Rgb565> for WireColor {
    fn from(color: Rgb565) -> Self {
        Self::from_rgb565(color)
    }
}

impl From<WireColor> for Rgb565 {
    fn from(color: WireColor) -> Self {
        color.to_rgb565()
    }
}

/// Static description of a sink's addressable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayInfo {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

/// Destination for rendered pixels.
///
/// Implemented by the ILI9341 SPI driver on hardware and by
/// [`crate::mocks::RecordingSink`] on the host.
pub trait DisplaySink {
    /// Error type for transport failures.
    type Error: core::fmt::Debug;

    /// Addressable area of the panel.
    fn info(&self) -> DisplayInfo;

    /// Bring the panel into a state where it accepts pixel writes.
    async fn init(&mut self) -> Result<(), Self::Error>;

    /// Fill the whole panel with one color.
    async fn clear(&mut self, color: WireColor) -> Result<(), Self::Error>;

    /// Write a single pixel.
    async fn set_pixel(&mut self, x: u16, y: u16, color: WireColor) -> Result<(), Self::Error>;

    /// Write a `w` × `h` block of row-major pixels at (`x`, `y`).
    async fn blit(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        data: &[WireColor],
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::RgbColor;

    #[test]
    fn test_wire_bytes_are_high_byte_first() {
        assert_eq!(WireColor::from_raw(0xF800).to_bytes(), [0xF8, 0x00]);
        assert_eq!(WireColor::from_raw(0x528A).to_bytes(), [0x52, 0x8A]);
    }

    #[test]
    fn test_raw_round_trip() {
        let c = WireColor::from_raw(0x1234);
        assert_eq!(c.to_raw(), 0x1234);
        assert_eq!(WireColor::from_wire(c.wire()), c);
    }

    #[test]
    fn test_rgb565_conversion() {
        assert_eq!(WireColor::from(Rgb565::RED).to_raw(), 0xF800);
        assert_eq!(Rgb565::from(WireColor::from_raw(0x001F)), Rgb565::BLUE);
    }
}
