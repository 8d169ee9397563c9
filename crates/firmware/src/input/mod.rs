//! Button input.
//!
//! [`GpioButtons`] implements [`platform::ButtonPad`] over eight input pins,
//! so application code polls the same trait on hardware and in tests.

pub mod gpio;

pub use gpio::{GpioButtons, BUTTON_PINS};
pub use platform::{Button, ButtonPad, ButtonState};
