use std::time::{Duration, Instant};

use crate::config::MAX_CATCH_UP_TICKS;

/// Fixed-cadence tick scheduler.
///
/// The frame loop asks how many ticks are owed since the previous one. A
/// slow frame is caught up with several ticks in a row, up to
/// [`MAX_CATCH_UP_TICKS`]; beyond that the clock drops the backlog.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    interval: Duration,
    last_tick: Instant,
}

impl TickClock {
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            last_tick: now,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of ticks to run now and advances the clock.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let owed = elapsed.as_nanos() / self.interval.as_nanos();
        if owed == 0 {
            return 0;
        }

        if owed > u128::from(MAX_CATCH_UP_TICKS) {
            self.last_tick = now;
            return MAX_CATCH_UP_TICKS;
        }

        // `owed` fits in u32 here.
        let owed = owed as u32;
        self.last_tick += self.interval * owed;
        owed
    }

    /// Time left until the next tick is due.
    #[must_use]
    pub fn until_next(&self, now: Instant) -> Duration {
        (self.last_tick + self.interval).saturating_duration_since(now)
    }

    /// Restarts the cadence at `now`, e.g. after unpausing.
    pub fn reset(&mut self, now: Instant) {
        self.last_tick = now;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::config::MAX_CATCH_UP_TICKS;

    use super::TickClock;

    #[test]
    fn no_tick_before_interval_elapses() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(100), start);

        assert_eq!(clock.due_ticks(start + Duration::from_millis(99)), 0);
        assert_eq!(clock.due_ticks(start + Duration::from_millis(100)), 1);
    }

    #[test]
    fn cadence_does_not_drift_with_late_frames() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(100), start);

        assert_eq!(clock.due_ticks(start + Duration::from_millis(130)), 1);
        // The next tick is still due at 200ms, not 230ms.
        assert_eq!(clock.due_ticks(start + Duration::from_millis(200)), 1);
    }

    #[test]
    fn stalled_frame_catches_up_several_ticks() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(100), start);

        assert_eq!(clock.due_ticks(start + Duration::from_millis(320)), 3);
        assert_eq!(
            clock.until_next(start + Duration::from_millis(320)),
            Duration::from_millis(80)
        );
    }

    #[test]
    fn long_stall_is_capped_and_reanchored() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(100), start);
        let late = start + Duration::from_secs(5);

        assert_eq!(clock.due_ticks(late), MAX_CATCH_UP_TICKS);
        assert_eq!(clock.due_ticks(late + Duration::from_millis(50)), 0);
    }

    #[test]
    fn reset_restarts_the_cadence() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(100), start);
        let resumed = start + Duration::from_secs(3);

        clock.reset(resumed);

        assert_eq!(clock.due_ticks(resumed + Duration::from_millis(60)), 0);
        assert_eq!(clock.until_next(resumed), Duration::from_millis(100));
    }
}
