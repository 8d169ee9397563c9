//! GPU command set.
//!
//! Every producer call is encoded as one or more [`Command`]s. A command is
//! an (opcode, operand) pair carried through the channel as a single
//! message, so the two halves can never be split by another push.

/// Numeric opcode of a [`Command`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Fill every tile with the background color.
    Clear = 0,
    /// Set the background color register.
    SetBackgroundColor = 1,
    /// Set the foreground color register.
    SetForegroundColor = 2,
    /// Select the active palette.
    SetPalette = 3,
    /// Set the cursor x register.
    SetX = 4,
    /// Set the cursor y register.
    SetY = 5,
    /// Set the pending width register.
    SetW = 6,
    /// Set the pending height register.
    SetH = 7,
    /// Plot one pixel at the cursor.
    SetPixel = 8,
    /// Copy an indexed image to the cursor.
    Blit = 9,
    /// Rasterize a text slot at the cursor.
    PrintSmall = 10,
    /// Frame boundary: pace and flush.
    Sync = 11,
}

/// One unit of work for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Fill the framebuffer with `palette[active][background]`.
    Clear,
    /// Background color index.
    SetBackgroundColor(u8),
    /// Foreground color index.
    SetForegroundColor(u8),
    /// Palette index; values past the bank are ignored.
    SetPalette(u8),
    /// Cursor x.
    SetX(u16),
    /// Cursor y.
    SetY(u16),
    /// Pending width.
    SetW(u16),
    /// Pending height.
    SetH(u16),
    /// Color index to plot at the cursor.
    SetPixel(u8),
    /// Row-major indexed image, `w` × `h` from the registers. Index 0 is transparent.
    Blit(&'static [u8]),
    /// Text slot to rasterize with the foreground color.
    PrintSmall(u8),
    /// Frame boundary.
    Sync,
}

impl Command {
    /// The command's opcode.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Clear => Opcode::Clear,
            Self::SetBackgroundColor(_) => Opcode::SetBackgroundColor,
            Self::SetForegroundColor(_) => Opcode::SetForegroundColor,
            Self::SetPalette(_) => Opcode::SetPalette,
            Self::SetX(_) => Opcode::SetX,
            Self::SetY(_) => Opcode::SetY,
            Self::SetW(_) => Opcode::SetW,
            Self::SetH(_) => Opcode::SetH,
            Self::SetPixel(_) => Opcode::SetPixel,
            Self::Blit(_) => Opcode::Blit,
            Self::PrintSmall(_) => Opcode::PrintSmall,
            Self::Sync => Opcode::Sync,
        }
    }

    /// The operand as a machine word.
    ///
    /// For [`Command::Blit`] this is the address of the image data.
    pub fn operand(&self) -> usize {
        match *self {
            Self::Clear | Self::Sync => 0,
            Self::SetBackgroundColor(v)
            | Self::SetForegroundColor(v)
            | Self::SetPalette(v)
            | Self::SetPixel(v)
            | Self::PrintSmall(v) => usize::from(v),
            Self::SetX(v) | Self::SetY(v) | Self::SetW(v) | Self::SetH(v) => usize::from(v),
            Self::Blit(data) => data.as_ptr() as usize,
        }
    }
}
