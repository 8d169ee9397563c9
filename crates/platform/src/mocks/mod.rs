//! Mock implementations for testing
//!
//! This module provides host implementations of the platform traits for use
//! in unit and integration tests across the workspace.

#![cfg(any(test, feature = "std"))]

use core::sync::atomic::{AtomicU64, Ordering};

use crate::{Button, ButtonPad, ButtonState, Clock, DisplayInfo, DisplaySink, WireColor};

/// One call observed by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    /// `init()`
    Init,
    /// `clear(color)`
    Clear(WireColor),
    /// `set_pixel(x, y, color)`
    SetPixel {
        /// Column
        x: u16,
        /// Row
        y: u16,
        /// Written color
        color: WireColor,
    },
    /// `blit(x, y, w, h, data)`
    Blit {
        /// Left edge
        x: u16,
        /// Top edge
        y: u16,
        /// Width
        w: u16,
        /// Height
        h: u16,
        /// Copy of the pixel data
        data: Vec<WireColor>,
    },
}

/// Error injected by [`RecordingSink::fail_next_blits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSinkError;

/// In-memory panel that records every call it receives.
///
/// Besides the call log it keeps a full-resolution pixel store so tests can
/// assert on what would be visible on glass.
pub struct RecordingSink {
    width: u16,
    height: u16,
    calls: Vec<SinkCall>,
    panel: Vec<WireColor>,
    failing_blits: usize,
}

impl RecordingSink {
    /// Create a sink with the given panel size, filled with black.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            panel: vec![WireColor::BLACK; usize::from(width) * usize::from(height)],
            failing_blits: 0,
        }
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Number of `blit` calls received.
    pub fn blit_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::Blit { .. }))
            .count()
    }

    /// Forget the call log (panel contents are kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Make the next `count` blits fail without touching the panel.
    pub fn fail_next_blits(&mut self, count: usize) {
        self.failing_blits = count;
    }

    /// Color currently shown at (`x`, `y`), or `None` outside the panel.
    pub fn pixel(&self, x: u16, y: u16) -> Option<WireColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.panel
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    fn put(&mut self, x: u16, y: u16, color: WireColor) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        if let Some(slot) = self.panel.get_mut(idx) {
            *slot = color;
        }
    }
}

impl DisplaySink for RecordingSink {
    type Error = MockSinkError;

    fn info(&self) -> DisplayInfo {
        DisplayInfo {
            width: self.width,
            height: self.height,
        }
    }

    async fn init(&mut self) -> Result<(), Self::Error> {
        self.calls.push(SinkCall::Init);
        Ok(())
    }

    async fn clear(&mut self, color: WireColor) -> Result<(), Self::Error> {
        self.calls.push(SinkCall::Clear(color));
        self.panel.fill(color);
        Ok(())
    }

    async fn set_pixel(&mut self, x: u16, y: u16, color: WireColor) -> Result<(), Self::Error> {
        self.calls.push(SinkCall::SetPixel { x, y, color });
        self.put(x, y, color);
        Ok(())
    }

    async fn blit(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        data: &[WireColor],
    ) -> Result<(), Self::Error> {
        if self.failing_blits > 0 {
            self.failing_blits -= 1;
            return Err(MockSinkError);
        }
        self.calls.push(SinkCall::Blit {
            x,
            y,
            w,
            h,
            data: data.to_vec(),
        });
        for (i, &color) in data.iter().enumerate() {
            let (Ok(dx), Ok(dy)) = (
                u16::try_from(i % usize::from(w.max(1))),
                u16::try_from(i / usize::from(w.max(1))),
            ) else {
                continue;
            };
            if dy >= h {
                break;
            }
            self.put(x.saturating_add(dx), y.saturating_add(dy), color);
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
///
/// Shared by reference between a test and the code under test.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `start_us`.
    pub fn new(start_us: u64) -> Self {
        Self {
            now: AtomicU64::new(start_us),
        }
    }

    /// Move time forward.
    pub fn advance_us(&self, delta: u64) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set_us(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Scripted button pad.
///
/// Each `read()` consumes the next queued sample; once the script runs dry
/// it keeps returning [`ButtonState::NONE`].
pub struct MockButtons {
    script: heapless::Deque<ButtonState, 16>,
    state: ButtonState,
}

impl MockButtons {
    /// Create a pad with an empty script.
    pub fn new() -> Self {
        Self {
            script: heapless::Deque::new(),
            state: ButtonState::NONE,
        }
    }

    /// Queue a sample with the given buttons held.
    pub fn push_sample(&mut self, held: &[Button]) -> Result<(), ButtonState> {
        let sample = held
            .iter()
            .fold(ButtonState::NONE, |acc, &b| acc.with(b));
        self.script.push_back(sample)
    }
}

impl Default for MockButtons {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonPad for MockButtons {
    fn read(&mut self) -> ButtonState {
        self.state = self.script.pop_front().unwrap_or(ButtonState::NONE);
        self.state
    }

    fn state(&self) -> ButtonState {
        self.state
    }
}
