//! Text slot ring.
//!
//! `print_small` formats on the producer side into one of sixteen bounded
//! slots and sends only the slot number through the command queue. The
//! renderer copies the slot out when it executes the command.
//!
//! Slots are handed out in order and only recycled when a frame is flushed.
//! A seventeenth `print_small` before the next flush is dropped rather than
//! overwriting a slot the renderer may not have read yet.

use core::cell::RefCell;
use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::String;

use crate::config::{
    PRINT_RIGHT, PRINT_RIGHT_START, RESOLUTION_WIDTH, SMALL_CHAR_ADVANCE, TEXT_SLOT_CAPACITY,
    TEXT_SLOT_LENGTH,
};

/// Contents of one slot.
pub type SlotText = String<TEXT_SLOT_LENGTH>;

struct Slots {
    text: [SlotText; TEXT_SLOT_CAPACITY],
    next: usize,
}

/// Fixed ring of text slots shared by the producer and the renderer.
pub struct TextSlotRing {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Slots>>,
}

impl TextSlotRing {
    /// An empty ring.
    pub const fn new() -> Self {
        const EMPTY: SlotText = String::new();
        Self {
            inner: Mutex::new(RefCell::new(Slots {
                text: [EMPTY; TEXT_SLOT_CAPACITY],
                next: 0,
            })),
        }
    }

    /// Store `text` in the next free slot and return its number.
    ///
    /// Returns `None` when every slot has been handed out since the last reset.
    pub fn allocate(&self, text: &SlotText) -> Option<u8> {
        self.inner.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let index = slots.next;
            let slot = slots.text.get_mut(index)?;
            slot.clone_from(text);
            slots.next = index + 1;
            u8::try_from(index).ok()
        })
    }

    /// Copy out the contents of `slot`.
    pub fn read(&self, slot: u8) -> Option<SlotText> {
        self.inner
            .lock(|cell| cell.borrow().text.get(usize::from(slot)).cloned())
    }

    /// Make every slot available again.
    pub fn reset(&self) {
        self.inner.lock(|cell| cell.borrow_mut().next = 0);
    }

    /// Slots handed out since the last reset.
    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().next)
    }

    /// No slot handed out since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TextSlotRing {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Write` adapter that keeps whatever fits and drops the rest.
struct Truncating<'a> {
    out: &'a mut SlotText,
    truncated: bool,
}

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        for c in s.chars() {
            if self.out.push(c).is_err() {
                self.truncated = true;
                break;
            }
        }
        Ok(())
    }
}

/// Format `args` into a slot-sized string.
///
/// Output past [`TEXT_SLOT_LENGTH`] bytes is cut at a character boundary;
/// the flag reports whether that happened.
pub fn format_bounded(args: fmt::Arguments<'_>) -> (SlotText, bool) {
    let mut out = SlotText::new();
    let mut writer = Truncating {
        out: &mut out,
        truncated: false,
    };
    // Truncating never fails, so an error can only come from a Display impl.
    let _ = writer.write_fmt(args);
    let truncated = writer.truncated;
    (out, truncated)
}

/// Resolve the left edge of a `print_small` string.
///
/// Below [`PRINT_RIGHT_START`] `x` is used as given. From there on it encodes
/// a right margin: `PRINT_RIGHT - m` ends the text `m` pixels from the right
/// edge, so the left edge is `width - text_width - (PRINT_RIGHT - x)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // len <= TEXT_SLOT_LENGTH
pub fn text_origin_x(x: u16, len: usize) -> i32 {
    if x < PRINT_RIGHT_START {
        return i32::from(x);
    }
    let text_width = len as i32 * i32::from(SMALL_CHAR_ADVANCE);
    i32::from(RESOLUTION_WIDTH) - text_width - (i32::from(PRINT_RIGHT) - i32::from(x))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn slot(s: &str) -> SlotText {
        SlotText::try_from(s).unwrap()
    }

    #[test]
    fn test_allocate_in_order_until_full() {
        let ring = TextSlotRing::new();
        for i in 0..TEXT_SLOT_CAPACITY {
            assert_eq!(ring.allocate(&slot("hi")), Some(i as u8));
        }
        assert_eq!(ring.allocate(&slot("dropped")), None);
        assert_eq!(ring.len(), TEXT_SLOT_CAPACITY);
        assert_eq!(ring.read(15).unwrap().as_str(), "hi");
    }

    #[test]
    fn test_reset_recycles_slots() {
        let ring = TextSlotRing::new();
        ring.allocate(&slot("first")).unwrap();
        ring.reset();
        assert!(ring.is_empty());
        assert_eq!(ring.allocate(&slot("second")), Some(0));
        assert_eq!(ring.read(0).unwrap().as_str(), "second");
    }

    #[test]
    fn test_read_out_of_range() {
        let ring = TextSlotRing::new();
        assert_eq!(ring.read(16), None);
    }

    #[test]
    fn test_format_bounded_fits() {
        let (text, truncated) = format_bounded(format_args!("score {}", 42));
        assert_eq!(text.as_str(), "score 42");
        assert!(!truncated);
    }

    #[test]
    fn test_format_bounded_truncates_at_char_boundary() {
        // 63 ASCII bytes then a two-byte character that does not fit.
        let (text, truncated) = format_bounded(format_args!("{}é!", "a".repeat(63)));
        assert!(truncated);
        assert_eq!(text.len(), 63);
        assert!(text.chars().all(|c| c == 'a'));
    }

    #[test]
    fn test_left_aligned_origin() {
        assert_eq!(text_origin_x(10, 5), 10);
        assert_eq!(text_origin_x(PRINT_RIGHT_START - 1, 5), 3999);
    }

    #[test]
    fn test_right_aligned_origin() {
        // "12345" is 30 px wide; PRINT_RIGHT puts its end flush with the edge.
        assert_eq!(text_origin_x(PRINT_RIGHT, 5), 130);
        assert_eq!(text_origin_x(PRINT_RIGHT - 4, 5), 126);
    }
}
