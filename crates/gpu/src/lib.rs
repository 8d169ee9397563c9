//! Virtual console GPU
//!
//! An asynchronous, cross-core graphics engine for a 160×120 indexed-color
//! screen. Application code on one core pushes drawing commands; the
//! renderer on the other core executes them into a tiled framebuffer and,
//! at each frame boundary, flushes the tiles that changed to the panel.
//!
//! # Architecture
//!
//! ```text
//!   core 0                                core 1
//!   ┌─────────┐   CommandChannel (500)   ┌──────────────┐   DisplaySink
//!   │  Gpu    │ ───────────────────────▶ │  Renderer    │ ─────────────▶ panel
//!   └─────────┘                          │  registers   │
//!       │        TextSlotRing (16×64)    │  palettes    │
//!       └──────────────────────────────▶ │  tile cache  │
//!       ▲                                │  pacer       │
//!       └──────── Telemetry ──────────── └──────────────┘
//! ```
//!
//! Everything the renderer draws with belongs to the [`Renderer`]; the
//! producer only ever sees the queue, the text slots and the published
//! frame timings.
//!
//! # Example
//!
//! ```no_run
//! use gpu::renderer::RenderTargets;
//! use gpu::{GpuConfig, GpuShared, Renderer};
//! use platform::{DisplaySink, EmbassyClock};
//! use static_cell::ConstStaticCell;
//!
//! static GPU: GpuShared = GpuShared::new();
//! static TARGETS: ConstStaticCell<RenderTargets> = ConstStaticCell::new(RenderTargets::new());
//!
//! async fn start<S: DisplaySink>(sink: S) -> Result<(), gpu::GpuError> {
//!     let (mut gpu, port) = GPU.split()?;
//!     let config = GpuConfig::default();
//!     let renderer = Renderer::new(port, TARGETS.take(), sink, EmbassyClock, config)?;
//!     // renderer.run() goes to the other core.
//!     # drop(renderer);
//!     gpu.set_pixel(10, 10, 5).await;
//!     gpu.sync().await;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `std`: host builds and the platform mocks
//! - `defmt`: defmt log sites and `Format` derives (hardware)
//! - `tracing`: tracing log sites (host)

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(async_fn_in_trait)]

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

pub mod api;
pub mod channel;
pub mod command;
pub mod config;
pub mod font;
pub mod pacer;
pub mod palette;
pub mod registers;
pub mod renderer;
pub mod text;
pub mod tile_cache;

pub use api::Gpu;
pub use command::{Command, Opcode};
pub use config::GpuConfig;
pub use pacer::FrameStats;
pub use palette::{PaletteError, PaletteId};
pub use renderer::{Renderer, RendererPort};

use channel::{CommandChannel, CommandConsumer, CommandProducer};
use pacer::Telemetry;
use text::TextSlotRing;

/// GPU errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpuError {
    /// [`GpuShared::split`] was called a second time.
    AlreadySplit,
    /// The palette bank could not be built.
    Palette(PaletteError),
}

impl core::fmt::Display for GpuError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadySplit => write!(f, "GPU handles already taken"),
            Self::Palette(e) => write!(f, "palette error: {e}"),
        }
    }
}

impl From<PaletteError> for GpuError {
    fn from(e: PaletteError) -> Self {
        Self::Palette(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Palette(e) => Some(e),
            Self::AlreadySplit => None,
        }
    }
}

/// State shared between the producer and the renderer.
///
/// Const-constructible so it can live in a `static` visible to both cores.
pub struct GpuShared {
    commands: CommandChannel,
    text: TextSlotRing,
    telemetry: Telemetry,
    taken: Mutex<CriticalSectionRawMutex, Cell<bool>>,
}

impl GpuShared {
    /// Empty queue, empty text slots, zeroed telemetry.
    pub const fn new() -> Self {
        Self {
            commands: CommandChannel::new(),
            text: TextSlotRing::new(),
            telemetry: Telemetry::new(),
            taken: Mutex::new(Cell::new(false)),
        }
    }

    /// Hand out the single producer and the single renderer port.
    ///
    /// Queues an initial `Clear` so the first frame starts from the
    /// background color.
    pub fn split(&self) -> Result<(Gpu<'_>, RendererPort<'_>), GpuError> {
        if self.taken.lock(|taken| taken.replace(true)) {
            return Err(GpuError::AlreadySplit);
        }
        let mut producer = CommandProducer::new(&self.commands);
        // The queue was never handed out, so it is empty.
        let _ = producer.try_push(Command::Clear);
        let gpu = Gpu::new(producer, &self.text, &self.telemetry);
        let port = RendererPort {
            commands: CommandConsumer::new(&self.commands),
            text: &self.text,
            telemetry: &self.telemetry,
        };
        Ok((gpu, port))
    }
}

impl Default for GpuShared {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_only_once() {
        let shared = GpuShared::new();
        assert!(shared.split().is_ok());
        assert!(matches!(shared.split(), Err(GpuError::AlreadySplit)));
    }

    #[test]
    fn test_split_queues_initial_clear() {
        let shared = GpuShared::new();
        let (_gpu, mut port) = shared.split().unwrap();
        assert_eq!(port.commands.try_pop(), Some(Command::Clear));
        assert_eq!(port.commands.try_pop(), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(GpuError::AlreadySplit.to_string(), "GPU handles already taken");
        assert_eq!(
            GpuError::from(PaletteError::NoGradeStops).to_string(),
            "palette error: color grade needs at least two stops"
        );
    }
}
