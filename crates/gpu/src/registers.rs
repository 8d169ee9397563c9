//! Cursor and attribute registers.
//!
//! Owned by the renderer and written only by `Set*` commands; drawing
//! commands read whatever the preceding commands in the stream left here.

use crate::command::Command;
use crate::config::GpuConfig;
use crate::palette::PaletteId;

/// Renderer register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Registers {
    /// Cursor x.
    pub x: u16,
    /// Cursor y.
    pub y: u16,
    /// Pending width for the next blit.
    pub w: u16,
    /// Pending height for the next blit.
    pub h: u16,
    /// Background color index.
    pub background: u8,
    /// Foreground color index.
    pub foreground: u8,
    /// Active palette.
    pub palette: PaletteId,
}

impl Registers {
    /// Power-on register values.
    pub fn new(config: &GpuConfig) -> Self {
        Self {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            background: config.background,
            foreground: config.foreground,
            palette: PaletteId::Default,
        }
    }

    /// Apply a register write.
    ///
    /// Returns `false` for commands that are not register writes, leaving the
    /// registers untouched. A palette index past the bank is swallowed.
    pub fn apply(&mut self, command: &Command) -> bool {
        match *command {
            Command::SetBackgroundColor(c) => self.background = c,
            Command::SetForegroundColor(c) => self.foreground = c,
            Command::SetPalette(index) => {
                if let Some(id) = PaletteId::from_index(index) {
                    self.palette = id;
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("ignoring palette index {=u8}", index);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(index, "ignoring palette index");
                }
            }
            Command::SetX(v) => self.x = v,
            Command::SetY(v) => self.y = v,
            Command::SetW(v) => self.w = v,
            Command::SetH(v) => self.h = v,
            Command::Clear
            | Command::SetPixel(_)
            | Command::Blit(_)
            | Command::PrintSmall(_)
            | Command::Sync => return false,
        }
        true
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(&GpuConfig::default())
    }
}
