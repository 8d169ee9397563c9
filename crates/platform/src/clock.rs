//! Monotonic time source
//!
//! Frame pacing and the step scheduler both work in whole microseconds since
//! boot. Taking the clock as a trait keeps both testable with a manual clock.

/// Monotonic microsecond clock.
pub trait Clock {
    /// Microseconds elapsed since an arbitrary fixed origin (normally boot).
    fn now_us(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Clock backed by the embassy time driver.
///
/// On hardware the driver is the RP2040 timer peripheral; on the host
/// embassy-time's `std` feature supplies it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
