//! Step scheduling decoupled from the frame rate
//!
//! The scheduler is ticked once per rendered frame with the frame's delta time and
//! answers whether a simulation step should run on this frame.

/// Shortest allowed time between steps, in seconds
pub const INTERVAL_MIN: f32 = 0.001;
/// Longest allowed time between steps, in seconds
pub const INTERVAL_MAX: f32 = 2.0;
/// Interval used when none is configured
pub const INTERVAL_DEFAULT: f32 = 0.05;
/// Exponential rate of interval change per second of held input
pub const INTERVAL_SCALE_STRENGTH: f32 = 1.0;

/// Direction of an interval adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalDirection {
    /// Longer interval, fewer steps per second
    Slower,
    /// Shorter interval, more steps per second
    Faster,
}

impl IntervalDirection {
    fn sign(self) -> f32 {
        match self {
            IntervalDirection::Slower => 1.0,
            IntervalDirection::Faster => -1.0,
        }
    }
}

/// Accumulated-time step clock with pause support
#[derive(Debug, Clone)]
pub struct IterationScheduler {
    interval: f32,
    elapsed: f32,
    running: bool,
}

impl IterationScheduler {
    pub fn new(interval: f32, running: bool) -> Self {
        Self {
            interval: interval.clamp(INTERVAL_MIN, INTERVAL_MAX),
            elapsed: 0.0,
            running,
        }
    }

    /// Advance the clock by one frame. Returns true when a step should run.
    ///
    /// At most one step fires per call. The remainder past the interval is carried
    /// forward but kept strictly below one interval, so a long stall turns into a single
    /// catch-up step on the next frame rather than a burst.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        self.elapsed += delta_time.max(0.0);

        if !self.running || self.elapsed < self.interval {
            return false;
        }

        self.elapsed = (self.elapsed - self.interval).min(self.max_remainder());
        true
    }

    /// Largest accumulator value that does not yet trigger a step
    fn max_remainder(&self) -> f32 {
        self.interval * (1.0 - f32::EPSILON)
    }

    /// Flip between running and paused. Callers invoke this once per key press.
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    /// Scale the interval exponentially by `delta_time` seconds of held input and
    /// return the new, clamped interval.
    pub fn scale_interval(&mut self, direction: IntervalDirection, delta_time: f32) -> f32 {
        let factor = (direction.sign() * delta_time * INTERVAL_SCALE_STRENGTH).exp();
        self.interval = (self.interval * factor).clamp(INTERVAL_MIN, INTERVAL_MAX);
        self.interval
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for IterationScheduler {
    fn default() -> Self {
        Self::new(INTERVAL_DEFAULT, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_twice_over_quarter_second() {
        let mut scheduler = IterationScheduler::new(0.1, true);
        let fired: Vec<bool> = (0..5).map(|_| scheduler.tick(0.05)).collect();

        assert_eq!(fired, vec![false, true, false, true, false]);
        assert!((scheduler.elapsed() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_at_most_one_step_per_tick() {
        let mut scheduler = IterationScheduler::new(0.1, true);
        assert!(scheduler.tick(1.0));
        assert!(scheduler.elapsed() < scheduler.interval());
        assert!(!scheduler.tick(0.0));
        // the retained backlog fires on the next frame with any time in it
        assert!(scheduler.tick(0.001));
        assert!(scheduler.elapsed() < scheduler.interval());
    }

    #[test]
    fn test_excess_below_one_interval_is_retained() {
        let mut scheduler = IterationScheduler::new(0.1, true);
        assert!(scheduler.tick(0.15));
        assert!((scheduler.elapsed() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_long_stall_leaves_remainder_below_interval() {
        let mut scheduler = IterationScheduler::new(0.1, true);
        assert!(scheduler.tick(0.35));
        assert!(scheduler.elapsed() < scheduler.interval());
        assert!(scheduler.elapsed() > 0.09);
    }

    #[test]
    fn test_remainder_bounded_after_every_step() {
        for interval in [INTERVAL_MIN, 0.0137, 0.1, 1.0, INTERVAL_MAX] {
            let mut scheduler = IterationScheduler::new(interval, true);
            for delta in [0.0, 0.004, 0.05, 0.3, 3.0].iter().cycle().take(500) {
                let fired = scheduler.tick(*delta);
                assert!(scheduler.elapsed() >= 0.0);
                if fired {
                    assert!(scheduler.elapsed() < scheduler.interval());
                }
            }
        }
    }

    #[test]
    fn test_paused_never_fires() {
        let mut scheduler = IterationScheduler::new(0.1, false);
        for _ in 0..20 {
            assert!(!scheduler.tick(0.05));
        }
        scheduler.toggle_running();
        assert!(scheduler.tick(0.0));
    }

    #[test]
    fn test_toggle_flips_once_per_call() {
        let mut scheduler = IterationScheduler::default();
        assert!(scheduler.is_running());
        assert!(!scheduler.toggle_running());
        assert!(scheduler.toggle_running());
    }

    #[test]
    fn test_interval_stays_in_bounds() {
        let mut scheduler = IterationScheduler::default();
        for _ in 0..500 {
            let interval = scheduler.scale_interval(IntervalDirection::Slower, 0.1);
            assert!((INTERVAL_MIN..=INTERVAL_MAX).contains(&interval));
        }
        assert_eq!(scheduler.interval(), INTERVAL_MAX);

        for _ in 0..500 {
            let interval = scheduler.scale_interval(IntervalDirection::Faster, 0.1);
            assert!((INTERVAL_MIN..=INTERVAL_MAX).contains(&interval));
        }
        assert_eq!(scheduler.interval(), INTERVAL_MIN);
    }

    #[test]
    fn test_interval_scaling_is_exponential() {
        let mut scheduler = IterationScheduler::new(0.1, true);
        let slower = scheduler.scale_interval(IntervalDirection::Slower, 0.5);
        assert!((slower - 0.1 * 0.5f32.exp()).abs() < 1e-6);
        let back = scheduler.scale_interval(IntervalDirection::Faster, 0.5);
        assert!((back - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_constructor_clamps_interval() {
        assert_eq!(IterationScheduler::new(0.0, true).interval(), INTERVAL_MIN);
        assert_eq!(IterationScheduler::new(60.0, true).interval(), INTERVAL_MAX);
    }
}
