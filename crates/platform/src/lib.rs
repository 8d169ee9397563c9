//! Hardware Abstraction Layer (HAL) for the handheld console
//!
//! This crate provides trait-based abstractions for the hardware the GPU
//! engine and the application logic talk to, enabling development and
//! testing without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (game step on core 0)
//!         ↓
//! GPU engine (gpu crate, renderer on core 1)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Board drivers (firmware crate: ILI9341, buttons, scheduler)
//! ```
//!
//! # Abstractions
//!
//! - [`DisplaySink`] - 16-bit color panel with clear/pixel/blit primitives
//! - [`Clock`] - monotonic microsecond time source
//! - [`ButtonPad`] - eight-button input polling unit
//!
//! # Features
//!
//! - `std`: Enable standard library support and host mocks
//! - `defmt`: Enable defmt derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{DisplaySink, WireColor};
//!
//! async fn example<D: DisplaySink>(display: &mut D) {
//!     let _ = display.clear(WireColor::from_raw(0x528A)).await;
//! }
//! ```

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
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded executors, Send bounds not needed

pub mod clock;
pub mod config;
pub mod display;
pub mod input;
pub mod mocks;

pub use clock::{Clock, EmbassyClock};
pub use display::{DisplayInfo, DisplaySink, WireColor};
pub use input::{Button, ButtonPad, ButtonState};
