use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

/// Source of wall-clock time for tap measurements
pub trait Clock {
    fn now(&self) -> SystemTime;
}

/// Production clock backed by `SystemTime::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock. Clones share the same instant, so a test can keep
/// one handle and move time forward while the controller owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: SystemTime) {
        self.now.set(at);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

/// Whether the controller is holding an arm point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapState {
    Idle,
    Armed(SystemTime),
}

/// What a single tap did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Armed,
    /// Elapsed milliseconds since the arm point, now the current score
    Measured(u64),
}

/// Turns taps into an elapsed-time score.
///
/// The first tap arms; every later tap measures against that same arm point
/// until [`TimingController::reset`] returns the controller to idle. A
/// measurement never clears the arm point.
#[derive(Debug)]
pub struct TimingController<C: Clock = SystemClock> {
    clock: C,
    state: TapState,
    score_ms: u64,
}

impl TimingController<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TimingController<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TimingController<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: TapState::Idle,
            score_ms: 0,
        }
    }

    pub fn on_tap(&mut self) -> TapOutcome {
        let now = self.clock.now();
        match self.state {
            TapState::Idle => {
                self.state = TapState::Armed(now);
                tracing::trace!("armed");
                TapOutcome::Armed
            }
            TapState::Armed(armed_at) => {
                self.score_ms = time_diff_ms(armed_at, now);
                tracing::trace!(elapsed_ms = self.score_ms, "measured");
                TapOutcome::Measured(self.score_ms)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = TapState::Idle;
        self.score_ms = 0;
    }

    /// Last published elapsed time in milliseconds, zero before any measurement
    pub fn current_score(&self) -> u64 {
        self.score_ms
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, TapState::Armed(_))
    }
}

/// Milliseconds from `start` to `end`, zero if the clock went backwards
pub fn time_diff_ms(start: SystemTime, end: SystemTime) -> u64 {
    saturating_millis(end.duration_since(start).unwrap_or_default())
}

fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (TimingController<ManualClock>, ManualClock) {
        let clock = ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
        (TimingController::with_clock(clock.clone()), clock)
    }

    #[test]
    fn first_tap_arms_without_scoring() {
        let (mut timing, _clock) = controller();
        assert_eq!(timing.state(), TapState::Idle);

        assert_eq!(timing.on_tap(), TapOutcome::Armed);
        assert!(timing.is_armed());
        assert_eq!(timing.current_score(), 0);
    }

    #[test]
    fn second_tap_measures_elapsed() {
        let (mut timing, clock) = controller();
        timing.on_tap();
        clock.advance(Duration::from_millis(237));

        assert_eq!(timing.on_tap(), TapOutcome::Measured(237));
        assert_eq!(timing.current_score(), 237);
    }

    #[test]
    fn third_tap_measures_from_original_arm_point() {
        let (mut timing, clock) = controller();
        let start = clock.now();
        timing.on_tap();
        clock.advance(Duration::from_millis(100));
        timing.on_tap();
        clock.advance(Duration::from_millis(400));

        assert_eq!(timing.on_tap(), TapOutcome::Measured(500));
        assert_eq!(timing.state(), TapState::Armed(start));
    }

    #[test]
    fn reset_returns_to_idle() {
        let (mut timing, clock) = controller();
        timing.on_tap();
        clock.advance(Duration::from_millis(80));
        timing.on_tap();

        timing.reset();
        assert_eq!(timing.current_score(), 0);
        assert_eq!(timing.state(), TapState::Idle);

        clock.advance(Duration::from_millis(10));
        assert_eq!(timing.on_tap(), TapOutcome::Armed);
        assert_eq!(timing.current_score(), 0);
    }

    #[test]
    fn epoch_is_a_valid_arm_point() {
        let clock = ManualClock::new(SystemTime::UNIX_EPOCH);
        let mut timing = TimingController::with_clock(clock.clone());

        timing.on_tap();
        assert_eq!(timing.state(), TapState::Armed(SystemTime::UNIX_EPOCH));
        clock.advance(Duration::from_millis(5));
        assert_eq!(timing.on_tap(), TapOutcome::Measured(5));
    }

    #[test]
    fn clock_stepping_backwards_scores_zero() {
        let (mut timing, clock) = controller();
        timing.on_tap();
        clock.set(SystemTime::UNIX_EPOCH);
        assert_eq!(timing.on_tap(), TapOutcome::Measured(0));
    }

    #[test]
    fn measurements_cover_a_range_of_gaps() {
        for gap in [0u64, 1, 59, 1_000, 86_400_000] {
            let (mut timing, clock) = controller();
            timing.on_tap();
            clock.advance(Duration::from_millis(gap));
            timing.on_tap();
            assert_eq!(timing.current_score(), gap);
        }
    }

    #[test]
    fn test_time_diff_ms() {
        let start = SystemTime::now();
        std::thread::sleep(Duration::from_millis(10));
        let end = SystemTime::now();

        let diff = time_diff_ms(start, end);
        assert!(diff >= 10);
        assert_eq!(time_diff_ms(end, start), 0);
    }

    #[test]
    fn huge_gaps_saturate() {
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
        assert_eq!(saturating_millis(Duration::from_millis(u64::MAX)), u64::MAX);
        assert_eq!(saturating_millis(Duration::from_micros(1_999)), 1);

        let start = SystemTime::UNIX_EPOCH;
        if let Some(end) = start.checked_add(Duration::from_secs(u64::MAX / 1000 + 1)) {
            assert_eq!(time_diff_ms(start, end), u64::MAX);
        }
    }
}
