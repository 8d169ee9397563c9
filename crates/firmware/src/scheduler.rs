//! Fixed-rate step scheduler.
//!
//! Runs the application's step at a target rate: time the step, then sleep
//! whatever is left of the cycle budget. A step that overruns its budget is
//! followed immediately by the next one; steps are never skipped, so an
//! overloaded game runs slow rather than dropping logic ticks.

use embedded_hal_async::delay::DelayNs;

use platform::{Clock, EmbassyClock};

/// One tick of application logic.
///
/// Implemented for any `FnMut() -> impl Future<Output = ()>`, so a closure
/// returning an `async` block works as a step.
pub trait Step {
    /// Run one step.
    async fn step(&mut self);
}

impl<F, Fut> Step for F
where
    F: FnMut() -> Fut,
    Fut: core::future::Future<Output = ()>,
{
    async fn step(&mut self) {
        (self)().await;
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerConfig {
    /// Target steps per second. Zero is treated as one.
    pub steps_per_second: u8,
}

impl SchedulerConfig {
    /// Cycle budget in microseconds.
    pub fn min_cycle_us(&self) -> u64 {
        1_000_000 / u64::from(self.steps_per_second.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            steps_per_second: 30,
        }
    }
}

/// Drives a [`Step`] at a fixed rate.
pub struct StepScheduler<C, D> {
    clock: C,
    delay: D,
    min_cycle_us: u64,
    last_step_us: u64,
    last_cycle_us: u64,
}

impl StepScheduler<EmbassyClock, embassy_time::Delay> {
    /// Scheduler on the embassy time driver.
    pub fn with_embassy(config: SchedulerConfig) -> Self {
        Self::new(EmbassyClock, embassy_time::Delay, config)
    }
}

impl<C: Clock, D: DelayNs> StepScheduler<C, D> {
    /// Both timings start at the cycle budget.
    pub fn new(clock: C, delay: D, config: SchedulerConfig) -> Self {
        let min_cycle_us = config.min_cycle_us();
        Self {
            clock,
            delay,
            min_cycle_us,
            last_step_us: min_cycle_us,
            last_cycle_us: min_cycle_us,
        }
    }

    /// Run one step and sleep out the rest of its budget.
    ///
    /// Returns the time slept, in microseconds.
    pub async fn step<S: Step>(&mut self, step: &mut S) -> u64 {
        let start = self.clock.now_us();
        step.step().await;
        self.last_step_us = self.clock.now_us().saturating_sub(start);

        let remaining = self.min_cycle_us.saturating_sub(self.last_step_us);
        if remaining > 0 {
            self.delay
                .delay_us(u32::try_from(remaining).unwrap_or(u32::MAX))
                .await;
        } else {
            #[cfg(feature = "defmt")]
            defmt::trace!(
                "step overran budget: {=u64} us > {=u64} us",
                self.last_step_us,
                self.min_cycle_us
            );
            #[cfg(feature = "tracing")]
            tracing::trace!(
                step_us = self.last_step_us,
                budget_us = self.min_cycle_us,
                "step overran budget"
            );
        }

        self.last_cycle_us = self.clock.now_us().saturating_sub(start);
        remaining
    }

    /// Step forever.
    pub async fn run<S: Step>(mut self, mut step: S) {
        #[cfg(feature = "defmt")]
        defmt::info!("step scheduler started, cycle {=u64} us", self.min_cycle_us);
        loop {
            self.step(&mut step).await;
        }
    }

    /// Duration of the last step, in microseconds.
    pub fn last_step_time(&self) -> u64 {
        self.last_step_us
    }

    /// Duration of the last full cycle (step plus sleep), in microseconds.
    pub fn last_cycle_time(&self) -> u64 {
        self.last_cycle_us
    }

    /// Cycle budget, in microseconds.
    pub fn min_cycle_time(&self) -> u64 {
        self.min_cycle_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use platform::mocks::ManualClock;

    /// Delay that moves a manual clock instead of waiting, and records requests.
    struct ClockDelay<'a> {
        clock: &'a ManualClock,
        slept_us: Vec<u32>,
    }

    impl DelayNs for ClockDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            self.clock.advance_us(u64::from(ns / 1_000));
        }

        async fn delay_us(&mut self, us: u32) {
            self.slept_us.push(us);
            self.clock.advance_us(u64::from(us));
        }
    }

    fn scheduler(clock: &ManualClock) -> StepScheduler<&ManualClock, ClockDelay<'_>> {
        let delay = ClockDelay {
            clock,
            slept_us: Vec::new(),
        };
        StepScheduler::new(clock, delay, SchedulerConfig::default())
    }

    #[test]
    fn test_config_budget() {
        assert_eq!(SchedulerConfig::default().min_cycle_us(), 33_333);
        assert_eq!(SchedulerConfig { steps_per_second: 0 }.min_cycle_us(), 1_000_000);
    }

    #[test]
    fn test_timings_seeded_to_budget() {
        let clock = ManualClock::new(0);
        let sched = scheduler(&clock);
        assert_eq!(sched.last_step_time(), 33_333);
        assert_eq!(sched.last_cycle_time(), 33_333);
    }

    #[tokio::test]
    async fn test_short_step_sleeps_remaining_budget() {
        let clock = ManualClock::new(0);
        let mut sched = scheduler(&clock);
        let clock_ref = &clock;
        let mut game = move || async move { clock_ref.advance_us(10_000) };

        let slept = sched.step(&mut game).await;

        assert_eq!(slept, 23_333);
        assert_eq!(sched.last_step_time(), 10_000);
        assert_eq!(sched.last_cycle_time(), 33_333);
        assert_eq!(sched.delay.slept_us, vec![23_333]);
    }

    #[tokio::test]
    async fn test_overrun_step_is_not_skipped_or_padded() {
        let clock = ManualClock::new(0);
        let mut sched = scheduler(&clock);
        let mut runs = 0u32;
        let mut game = || {
            runs += 1;
            clock.advance_us(50_000);
            async {}
        };

        assert_eq!(sched.step(&mut game).await, 0);
        assert_eq!(sched.step(&mut game).await, 0);

        assert_eq!(runs, 2);
        assert_eq!(sched.last_step_time(), 50_000);
        assert_eq!(sched.last_cycle_time(), 50_000);
        assert!(sched.delay.slept_us.is_empty());
    }

    struct Counter(u32);

    impl Step for Counter {
        async fn step(&mut self) {
            self.0 += 1;
        }
    }

    #[tokio::test]
    async fn test_step_trait_impl() {
        let clock = ManualClock::new(0);
        let mut sched = scheduler(&clock);
        let mut counter = Counter(0);
        for _ in 0..3 {
            sched.step(&mut counter).await;
        }
        assert_eq!(counter.0, 3);
        assert_eq!(clock.now_us(), 3 * 33_333);
    }
}
