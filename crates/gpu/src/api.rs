//! Producer-side drawing API.
//!
//! Every call turns into one or more commands on the queue and returns as
//! soon as they are enqueued; nothing is drawn until the renderer gets to
//! them. Calls wait only when the queue is full.

use core::fmt;

use crate::channel::CommandProducer;
use crate::command::Command;
use crate::pacer::{FrameStats, Telemetry};
use crate::text::{format_bounded, TextSlotRing};

/// Producer half of a split [`crate::GpuShared`].
///
/// There is exactly one per `GpuShared`; multi-command calls such as
/// [`Gpu::set_pixel`] rely on nothing else writing the cursor in between.
pub struct Gpu<'a> {
    commands: CommandProducer<'a>,
    text: &'a TextSlotRing,
    telemetry: &'a Telemetry,
}

impl<'a> Gpu<'a> {
    pub(crate) fn new(
        commands: CommandProducer<'a>,
        text: &'a TextSlotRing,
        telemetry: &'a Telemetry,
    ) -> Self {
        Self {
            commands,
            text,
            telemetry,
        }
    }

    /// Fill the screen with the background color.
    pub async fn clear(&mut self) {
        self.commands.push(Command::Clear).await;
    }

    /// Select the background color index used by [`Gpu::clear`].
    pub async fn set_background_color(&mut self, index: u8) {
        self.commands.push(Command::SetBackgroundColor(index)).await;
    }

    /// Select the foreground color index used by text.
    pub async fn set_foreground_color(&mut self, index: u8) {
        self.commands.push(Command::SetForegroundColor(index)).await;
    }

    /// Switch palettes. Indices past 16 are ignored by the renderer.
    pub async fn set_palette(&mut self, index: u8) {
        self.commands.push(Command::SetPalette(index)).await;
    }

    /// Plot one pixel.
    pub async fn set_pixel(&mut self, x: u16, y: u16, index: u8) {
        self.commands.push(Command::SetX(x)).await;
        self.commands.push(Command::SetY(y)).await;
        self.commands.push(Command::SetPixel(index)).await;
    }

    /// Draw a `w` × `h` indexed image, row-major. Index 0 is transparent.
    ///
    /// The image is borrowed for `'static` because the renderer reads it
    /// some time after this call returns.
    pub async fn blit(&mut self, x: u16, y: u16, w: u16, h: u16, image: &'static [u8]) {
        self.commands.push(Command::SetX(x)).await;
        self.commands.push(Command::SetY(y)).await;
        self.commands.push(Command::SetW(w)).await;
        self.commands.push(Command::SetH(h)).await;
        self.commands.push(Command::Blit(image)).await;
    }

    /// Draw formatted text in the small font with the foreground color.
    ///
    /// Text longer than 64 bytes is cut short. An `x` of
    /// [`crate::config::PRINT_RIGHT`] minus a margin right-aligns the text.
    ///
    /// Returns `false`, and draws nothing, once sixteen strings have been
    /// printed since the last flushed frame.
    ///
    /// ```no_run
    /// # async fn hud(gpu: &mut gpu::Gpu<'_>, score: u32) {
    /// use gpu::config::PRINT_RIGHT;
    /// gpu.print_small(PRINT_RIGHT - 2, 2, format_args!("{score}")).await;
    /// # }
    /// ```
    pub async fn print_small(&mut self, x: u16, y: u16, args: fmt::Arguments<'_>) -> bool {
        let (text, truncated) = format_bounded(args);
        if truncated {
            #[cfg(feature = "defmt")]
            defmt::debug!("print_small text truncated to {=usize} bytes", text.len());
            #[cfg(feature = "tracing")]
            tracing::debug!(len = text.len(), "print_small text truncated");
        }
        let Some(slot) = self.text.allocate(&text) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("print_small dropped: text slots exhausted");
            #[cfg(feature = "tracing")]
            tracing::warn!("print_small dropped: text slots exhausted");
            return false;
        };
        self.commands.push(Command::SetX(x)).await;
        self.commands.push(Command::SetY(y)).await;
        self.commands.push(Command::PrintSmall(slot)).await;
        true
    }

    /// End the frame. The renderer flushes it unless the previous flush was
    /// less than one frame interval ago.
    pub async fn sync(&mut self) {
        self.commands.push(Command::Sync).await;
    }

    /// Duration of the last flushed frame, in microseconds.
    pub fn last_frame_time(&self) -> u64 {
        self.telemetry.load().last_frame_us
    }

    /// Renderer busy time during the last flushed frame, in microseconds.
    pub fn last_busy_time(&self) -> u64 {
        self.telemetry.load().last_busy_us
    }

    /// Both timings of the last flushed frame.
    pub fn stats(&self) -> FrameStats {
        self.telemetry.load()
    }
}
