//! Application configuration and constants
//!
//! Central values shared by the GPU engine and the board drivers. Branding
//! and panel geometry should reference these constants rather than
//! hardcoding values.

/// The application name
pub const APP_NAME: &str = "Pico Console";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Physical panel width in pixels (ILI9341, landscape).
pub const DISPLAY_WIDTH: u16 = 320;

/// Physical panel height in pixels (ILI9341, landscape).
pub const DISPLAY_HEIGHT: u16 = 240;

/// Color shown on the panel before the first frame is flushed.
///
/// Native RGB565 (dark slate gray).
pub const BOOT_COLOR: u16 = 0x528A;
