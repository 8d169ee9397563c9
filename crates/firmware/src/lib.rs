//! Handheld console board drivers
//!
//! Concrete hardware behind the `platform` traits, plus the fixed-rate loop
//! that runs the game on the application core.
//!
//! # Architecture
//!
//! ```text
//! core 0: StepScheduler ── game step ── gpu::Gpu ──┐
//!                                                  │ command queue
//! core 1: gpu::Renderer ── Ili9341 (DisplaySink) ◄─┘
//! ```
//!
//! # Features
//!
//! - `hardware` - defmt log sites and `defmt::Format` derives
//! - `std` - host builds (tests, tooling)
//!
//! # Example
//!
//! ```no_run
//! use firmware::scheduler::{SchedulerConfig, StepScheduler};
//!
//! async fn game_loop() {
//!     let scheduler = StepScheduler::with_embassy(SchedulerConfig::default());
//!     let mut frame = 0u32;
//!     scheduler
//!         .run(move || {
//!             frame = frame.wrapping_add(1);
//!             async {}
//!         })
//!         .await;
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
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded executors, Send bounds not needed

pub mod display;
pub mod input;
pub mod scheduler;

pub use display::{Ili9341, SinkError};
pub use input::GpioButtons;
pub use scheduler::{SchedulerConfig, Step, StepScheduler};
