//! GPIO button pad.
//!
//! # Pin assignments
//!
//! | Button | RP2040 pin | Notes |
//! |--------|------------|-------|
//! | Up     | GP29 | Active-high, internal pull-down |
//! | Left   | GP28 | Active-high, internal pull-down |
//! | Down   | GP27 | Active-high, internal pull-down |
//! | Right  | GP26 | Active-high, internal pull-down |
//! | Back   | GP15 | Active-high, internal pull-down |
//! | Start  | GP14 | Active-high, internal pull-down |
//! | A      | GP8  | Active-high, internal pull-down |
//! | B      | GP0  | Active-high, internal pull-down |
//!
//! [`BUTTON_PINS`] carries the same table for board setup. Pull
//! configuration belongs to whoever constructs the pins; this driver only
//! reads levels. A pin read error counts as released.

use embedded_hal::digital::InputPin;

use platform::{Button, ButtonPad, ButtonState};

/// GPIO number wired to each button, in [`Button::ALL`] order.
pub const BUTTON_PINS: [u8; 8] = [29, 28, 27, 26, 15, 14, 8, 0];

/// Eight buttons on eight input pins, indexed in [`Button`] order.
pub struct GpioButtons<P> {
    pins: [P; 8],
    state: ButtonState,
}

impl<P: InputPin> GpioButtons<P> {
    /// `pins[i]` is the pin for `Button::ALL[i]`.
    pub fn new(pins: [P; 8]) -> Self {
        Self {
            pins,
            state: ButtonState::NONE,
        }
    }

    /// Give back the pins.
    pub fn release(self) -> [P; 8] {
        self.pins
    }
}

impl<P: InputPin> ButtonPad for GpioButtons<P> {
    fn read(&mut self) -> ButtonState {
        let mut sample = ButtonState::NONE;
        for (pin, button) in self.pins.iter_mut().zip(Button::ALL) {
            match pin.is_high() {
                Ok(true) => sample = sample.with(button),
                Ok(false) => {}
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("button {} read failed", button);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(?button, "button read failed");
                }
            }
        }
        self.state = sample;
        sample
    }

    fn state(&self) -> ButtonState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn pins(levels: &[[PinState; 8]]) -> [PinMock; 8] {
        core::array::from_fn(|i| {
            let txns: Vec<PinTransaction> = levels
                .iter()
                .map(|sample| PinTransaction::get(sample[i]))
                .collect();
            PinMock::new(&txns)
        })
    }

    fn done(pins: [PinMock; 8]) {
        for mut pin in pins {
            pin.done();
        }
    }

    #[test]
    fn test_button_pins_follow_board_wiring() {
        let wiring: Vec<(Button, u8)> = Button::ALL.into_iter().zip(BUTTON_PINS).collect();
        assert_eq!(wiring[0], (Button::Up, 29));
        assert_eq!(wiring[3], (Button::Right, 26));
        assert_eq!(wiring[6], (Button::A, 8));
        assert_eq!(wiring[7], (Button::B, 0));

        let mut sorted = BUTTON_PINS;
        sorted.sort_unstable();
        assert!(sorted.windows(2).all(|w| w[0] < w[1]), "pins are distinct");
        // RP2040 exposes GP0..=GP29.
        assert!(BUTTON_PINS.iter().all(|&pin| pin <= 29));
    }

    #[test]
    fn test_read_latches_sample() {
        use PinState::{High as H, Low as L};
        let mut pad = GpioButtons::new(pins(&[
            [L, L, L, L, L, L, H, L], // A
            [H, L, L, H, L, L, L, H], // Up + Right + B
        ]));

        assert_eq!(pad.state(), ButtonState::NONE);

        let first = pad.read();
        assert!(first.is_pressed(Button::A));
        assert_eq!(first.bits(), 0b0100_0000);
        assert_eq!(pad.state(), first);
        assert!(pad.is_pressed(Button::A));

        let second = pad.read();
        assert_eq!(second.bits(), 0b1000_1001);
        assert!(!pad.is_pressed(Button::A));
        assert!(pad.is_pressed(Button::Right));

        done(pad.release());
    }
}
