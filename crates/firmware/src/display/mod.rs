//! Display drivers for the handheld console.
//!
//! The panel is an ILI9341 320×240 TFT driven over SPI. The driver is always
//! compiled (no hardware gate) so the host test suite exercises it against
//! mocked SPI and GPIO.

pub mod ili9341;

pub use ili9341::{Command as DisplayCommand, Ili9341, SinkError, CHUNK_PIXELS, INIT_SEQUENCE};
