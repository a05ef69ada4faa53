use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

//
// ─── COUNTDOWN ────────────────────────────────────────────────────────────────
//

/// Result of advancing a `Countdown` by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not started, stopped, or already expired.
    Idle,
    Running { remaining: u64 },
    /// Remaining time just reached zero. Returned at most once per start.
    Expired,
}

/// Session countdown plus the per-question time reference.
///
/// Pure state: something outside calls `tick` once per wall-clock second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    total_secs: u64,
    remaining_secs: u64,
    running: bool,
    mark: Option<DateTime<Utc>>,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin counting down from `total_secs`; also marks `now`.
    pub fn start(&mut self, total_secs: u64, now: DateTime<Utc>) {
        self.total_secs = total_secs;
        self.remaining_secs = total_secs;
        self.running = true;
        self.mark = Some(now);
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            return Tick::Expired;
        }
        Tick::Running {
            remaining: self.remaining_secs,
        }
    }

    /// Halt ticking. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Reset the per-question reference point to `now`.
    pub fn mark(&mut self, now: DateTime<Utc>) {
        self.mark = Some(now);
    }

    /// Whole seconds since the last `mark`, never negative.
    #[must_use]
    pub fn elapsed_since_mark(&self, now: DateTime<Utc>) -> u64 {
        self.mark
            .map(|mark| u64::try_from((now - mark).num_seconds()).unwrap_or(0))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fraction of the budget still left, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn remaining_ratio(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / self.total_secs as f64
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(5));

        let mut system = Clock::default_clock();
        system.advance(Duration::seconds(5));
        assert!(!system.is_fixed());
    }

    #[test]
    fn countdown_expires_exactly_once() {
        let mut countdown = Countdown::new();
        countdown.start(3, fixed_now());

        assert_eq!(countdown.tick(), Tick::Running { remaining: 2 });
        assert_eq!(countdown.tick(), Tick::Running { remaining: 1 });
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn zero_budget_expires_on_first_tick() {
        let mut countdown = Countdown::new();
        countdown.start(0, fixed_now());
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.tick(), Tick::Idle);
        countdown.start(10, fixed_now());
        countdown.stop();
        countdown.stop();
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining_secs(), 10);
        assert!(!countdown.is_running());
    }

    #[test]
    fn elapsed_is_whole_seconds_since_mark() {
        let mut countdown = Countdown::new();
        let start = fixed_now();
        assert_eq!(countdown.elapsed_since_mark(start), 0);

        countdown.start(60, start);
        assert_eq!(
            countdown.elapsed_since_mark(start + Duration::milliseconds(2_900)),
            2
        );

        countdown.mark(start + Duration::seconds(10));
        assert_eq!(countdown.elapsed_since_mark(start + Duration::seconds(14)), 4);
        // A clock that went backwards never yields a negative duration.
        assert_eq!(countdown.elapsed_since_mark(start), 0);
    }

    #[test]
    fn ratio_tracks_remaining_budget() {
        let mut countdown = Countdown::new();
        assert!(countdown.remaining_ratio().abs() < f64::EPSILON);
        countdown.start(4, fixed_now());
        countdown.tick();
        assert!((countdown.remaining_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
