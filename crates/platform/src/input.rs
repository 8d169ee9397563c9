//! Input polling unit abstraction
//!
//! The console has eight momentary buttons. A read samples all of them at
//! once into a bitmask; game logic then queries the latched mask for the
//! rest of the step.

/// Physical buttons, in bit order of [`ButtonState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    /// D-pad up
    Up = 0,
    /// D-pad left
    Left = 1,
    /// D-pad down
    Down = 2,
    /// D-pad right
    Right = 3,
    /// Back button
    Back = 4,
    /// Start button
    Start = 5,
    /// A button
    A = 6,
    /// B button
    B = 7,
}

impl Button {
    /// Every button, in bit order.
    pub const ALL: [Button; 8] = [
        Button::Up,
        Button::Left,
        Button::Down,
        Button::Right,
        Button::Back,
        Button::Start,
        Button::A,
        Button::B,
    ];

    /// Bit position in a [`ButtonState`] mask.
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

/// One sample of all eight buttons; bit `n` set means button `n` is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ButtonState(u8);

impl ButtonState {
    /// No buttons held.
    pub const NONE: Self = Self(0);

    /// Wrap a raw mask.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw mask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` if `button` was held when the sample was taken.
    pub const fn is_pressed(self, button: Button) -> bool {
        (self.0 >> button.bit()) & 0b1 == 1
    }

    /// Return a copy with `button` marked held.
    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | (1 << button.bit()))
    }
}

/// Button polling unit.
pub trait ButtonPad {
    /// Sample every button, latch and return the result.
    fn read(&mut self) -> ButtonState;

    /// Most recently latched sample (no hardware access).
    fn state(&self) -> ButtonState;

    /// Convenience: `state().is_pressed(button)`.
    fn is_pressed(&self, button: Button) -> bool {
        self.state().is_pressed(button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_bits_follow_declaration_order() {
        for (i, b) in Button::ALL.iter().enumerate() {
            assert_eq!(usize::from(b.bit()), i);
        }
    }

    #[test]
    fn test_state_with_and_is_pressed() {
        let s = ButtonState::NONE.with(Button::Left).with(Button::A);
        assert_eq!(s.bits(), 0b0100_0010);
        assert!(s.is_pressed(Button::Left));
        assert!(s.is_pressed(Button::A));
        assert!(!s.is_pressed(Button::Right));
    }
}
