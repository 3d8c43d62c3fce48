//! Deterministic clock for freshness tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use skillgate_core::Clock;

/// Controllable clock for reproducible testing of time-dependent checks.
///
/// Clones share the same underlying instant, so a clock handed to a verifier
/// can still be advanced from the test body.
#[derive(Debug, Clone)]
pub struct TestClock {
    unix_nanos: Arc<AtomicI64>,
}

impl TestClock {
    /// Creates a test clock starting at the current system time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates a test clock pinned to a specific instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { unix_nanos: Arc::new(AtomicI64::new(start.timestamp_nanos_opt().unwrap_or(0))) }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.unix_nanos.fetch_add(nanos, Ordering::AcqRel);
    }

    /// Jumps the clock to a specific instant, forwards or backwards.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.unix_nanos.store(instant.timestamp_nanos_opt().unwrap_or(0), Ordering::Release);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.unix_nanos.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap();
        let clock = TestClock::at(start);

        clock.advance(Duration::from_secs(90));

        assert_eq!(clock.now_utc(), start + chrono::Duration::seconds(90));
    }

    #[test]
    fn clock_can_jump_backwards() {
        let start = Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap();
        let clock = TestClock::at(start);
        let earlier = start - chrono::Duration::days(1);

        clock.set(earlier);

        assert_eq!(clock.now_utc(), earlier);
    }

    #[test]
    fn clones_share_the_same_instant() {
        let clock = TestClock::at(Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap());
        let handle = clock.clone();

        clock.advance(Duration::from_secs(5));

        assert_eq!(handle.now_utc(), clock.now_utc());
    }
}
