//! The renderer: consumer side of the GPU.
//!
//! Holds every piece of drawing state (registers, palette bank, tile cache,
//! font, frame pacer) and is the only code that touches it. Commands arrive
//! through the channel in push order and are executed one at a time; a
//! `Sync` paces the frame and flushes dirty tiles to the [`DisplaySink`].

#[cfg(any(feature = "defmt", feature = "tracing"))]
use platform::config::{APP_NAME, APP_VERSION};
use platform::{Clock, DisplaySink, WireColor};

use crate::channel::CommandConsumer;
use crate::command::Command;
use crate::config::{
    GpuConfig, FRAMEBUFFER_X, FRAMEBUFFER_Y, TILE_COLUMNS, TILE_HEIGHT, TILE_ROWS, TILE_WIDTH,
};
use crate::font::FontAtlas;
use crate::pacer::{FrameDecision, FramePacer, FrameStats, Telemetry};
use crate::palette::{Palette, PaletteBank};
use crate::registers::Registers;
use crate::text::{text_origin_x, TextSlotRing};
use crate::tile_cache::{TileCache, TileIndex};
use crate::GpuError;

/// Consumer half of a split [`crate::GpuShared`].
pub struct RendererPort<'a> {
    pub(crate) commands: CommandConsumer<'a>,
    pub(crate) text: &'a TextSlotRing,
    pub(crate) telemetry: &'a Telemetry,
}

/// The renderer's large buffers: the framebuffer and the palette bank.
///
/// Together they take about 47 KB, more than the second core's stack, so
/// they live in a `static` and the renderer only borrows them. `new` is
/// const so a `static_cell::ConstStaticCell` can hold them without the
/// value ever passing through the stack:
///
/// ```no_run
/// use gpu::renderer::RenderTargets;
/// use static_cell::ConstStaticCell;
///
/// static TARGETS: ConstStaticCell<RenderTargets> = ConstStaticCell::new(RenderTargets::new());
///
/// let targets: &'static mut RenderTargets = TARGETS.take();
/// # let _ = targets;
/// ```
pub struct RenderTargets {
    tiles: TileCache,
    palettes: PaletteBank,
}

impl RenderTargets {
    /// Blank palettes and an all-dirty framebuffer. [`Renderer::new`]
    /// builds the palettes in place.
    pub const fn new() -> Self {
        Self {
            tiles: TileCache::new(),
            palettes: PaletteBank::new(),
        }
    }
}

impl Default for RenderTargets {
    fn default() -> Self {
        Self::new()
    }
}

/// Command executor and frame flusher.
pub struct Renderer<'a, S, C> {
    port: RendererPort<'a>,
    targets: &'a mut RenderTargets,
    sink: S,
    clock: C,
    registers: Registers,
    font: FontAtlas,
    pacer: FramePacer,
}

impl<'a, S, C> Renderer<'a, S, C>
where
    S: DisplaySink,
    C: Clock,
{
    /// Build the palette bank in `targets` and mark every tile dirty.
    ///
    /// Publishes the seed telemetry (`last_frame` = one frame interval) so
    /// the producer reads sane values before the first flush.
    pub fn new(
        port: RendererPort<'a>,
        targets: &'a mut RenderTargets,
        sink: S,
        clock: C,
        config: GpuConfig,
    ) -> Result<Self, GpuError> {
        targets.palettes.rebuild()?;
        targets.tiles.reset();
        let pacer = FramePacer::new(config.min_frame_interval_us());
        port.telemetry.publish(pacer.stats());
        Ok(Self {
            port,
            targets,
            sink,
            clock,
            registers: Registers::new(&config),
            font: FontAtlas::builtin(),
            pacer,
        })
    }

    /// Replace the built-in font.
    #[must_use]
    pub fn with_font(mut self, font: FontAtlas) -> Self {
        self.font = font;
        self
    }

    /// Initialize the display sink.
    pub async fn init_display(&mut self) -> Result<(), S::Error> {
        self.sink.init().await
    }

    /// Execute commands forever.
    pub async fn run(mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!(
            "{=str} v{=str} renderer started, min frame interval {=u64} us",
            APP_NAME,
            APP_VERSION,
            self.pacer.min_interval_us()
        );
        #[cfg(feature = "tracing")]
        tracing::info!(
            app = APP_NAME,
            version = APP_VERSION,
            min_frame_us = self.pacer.min_interval_us(),
            "renderer started"
        );
        loop {
            self.step().await;
        }
    }

    /// Wait for the next command and execute it.
    pub async fn step(&mut self) {
        let command = self.port.commands.pop().await;
        self.execute(command).await;
    }

    /// Execute every command already queued. Returns how many ran.
    pub async fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Some(command) = self.port.commands.try_pop() {
            self.execute(command).await;
            count += 1;
        }
        count
    }

    /// Execute one command.
    ///
    /// Time spent on anything but `Sync` counts toward the frame's busy time.
    pub async fn execute(&mut self, command: Command) {
        if command == Command::Sync {
            self.sync().await;
            return;
        }
        let start = self.clock.now_us();
        self.apply(command);
        let end = self.clock.now_us();
        self.pacer.record_busy(end.saturating_sub(start));
    }

    fn active_palette(&self) -> &Palette {
        self.targets.palettes.get(self.registers.palette)
    }

    fn apply(&mut self, command: Command) {
        if self.registers.apply(&command) {
            return;
        }
        let regs = self.registers;
        match command {
            Command::Clear => {
                let color = self.active_palette().get(regs.background);
                self.targets.tiles.clear(color);
            }
            Command::SetPixel(index) => {
                let color = self.active_palette().get(index);
                self.targets.tiles.set_pixel(regs.x, regs.y, color);
            }
            Command::Blit(image) => {
                let palette = self.targets.palettes.get(regs.palette);
                self.targets.tiles.blit(regs.x, regs.y, regs.w, regs.h, image, palette);
            }
            Command::PrintSmall(slot) => {
                // Copied out so the producer may keep allocating while we draw.
                let Some(text) = self.port.text.read(slot) else {
                    return;
                };
                let color = self.active_palette().get(regs.foreground);
                let left = text_origin_x(regs.x, text.len());
                let y = i32::from(regs.y);
                self.targets.tiles.print_small(left, y, text.as_bytes(), &self.font, color);
            }
            Command::SetBackgroundColor(_)
            | Command::SetForegroundColor(_)
            | Command::SetPalette(_)
            | Command::SetX(_)
            | Command::SetY(_)
            | Command::SetW(_)
            | Command::SetH(_)
            | Command::Sync => {}
        }
    }

    async fn sync(&mut self) {
        let now = self.clock.now_us();
        let FrameDecision::Flush { frame_start } = self.pacer.begin_sync(now) else {
            #[cfg(feature = "defmt")]
            defmt::trace!("sync at {=u64} us skipped", now);
            #[cfg(feature = "tracing")]
            tracing::trace!(now_us = now, "sync skipped");
            return;
        };

        let dirty: heapless::Vec<TileIndex, { TILE_ROWS * TILE_COLUMNS }> =
            self.targets.tiles.dirty_tiles().collect();
        let mut flushed = 0usize;
        for index in dirty {
            let Some(tile) = self.targets.tiles.tile(index) else {
                continue;
            };
            let (x, y) = index.origin();
            let result = self
                .sink
                .blit(
                    FRAMEBUFFER_X + x,
                    FRAMEBUFFER_Y + y,
                    TILE_WIDTH,
                    TILE_HEIGHT,
                    tile.pixels(),
                )
                .await;
            match result {
                Ok(()) => {
                    self.targets.tiles.mark_flushed(index);
                    flushed += 1;
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "tile ({=usize}, {=usize}) flush failed, left dirty",
                        index.row,
                        index.col
                    );
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        row = index.row,
                        col = index.col,
                        err = ?_err,
                        "tile flush failed, left dirty"
                    );
                }
            }
        }

        let frame_end = self.clock.now_us();
        let stats = self.pacer.finish_frame(frame_start, frame_end);
        self.port.telemetry.publish(stats);
        self.port.text.reset();

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "frame flushed: {=usize} tiles, frame {=u64} us, busy {=u64} us",
            flushed,
            stats.last_frame_us,
            stats.last_busy_us
        );
        #[cfg(feature = "tracing")]
        tracing::debug!(
            tiles = flushed,
            frame_us = stats.last_frame_us,
            busy_us = stats.last_busy_us,
            "frame flushed"
        );
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = flushed;
    }

    /// Register file as left by the last executed command.
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// The framebuffer.
    pub fn tiles(&self) -> &TileCache {
        &self.targets.tiles
    }

    /// The palette bank.
    pub fn palettes(&self) -> &PaletteBank {
        &self.targets.palettes
    }

    /// Resolve a color index through the active palette.
    pub fn resolve(&self, index: u8) -> WireColor {
        self.active_palette().get(index)
    }

    /// The display sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The display sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tear down the renderer and give back the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Timing of the last flushed frame.
    pub fn stats(&self) -> FrameStats {
        self.pacer.stats()
    }

    /// Duration of the last flushed frame, in microseconds.
    pub fn last_frame_time(&self) -> u64 {
        self.pacer.stats().last_frame_us
    }

    /// Busy time of the last flushed frame, in microseconds.
    pub fn last_busy_time(&self) -> u64 {
        self.pacer.stats().last_busy_us
    }

    /// Frames flushed so far.
    pub fn frames_flushed(&self) -> u32 {
        self.pacer.frames_flushed()
    }

    /// Syncs dropped for arriving early.
    pub fn frames_skipped(&self) -> u32 {
        self.pacer.frames_skipped()
    }
}
