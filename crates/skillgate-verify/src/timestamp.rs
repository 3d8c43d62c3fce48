//! Request timestamp freshness checking.
//!
//! Rejects requests whose declared timestamp falls outside a symmetric
//! tolerance window around the current time, bounding how long a captured
//! request stays replayable. The window alone does not defeat replay inside
//! the tolerance; the platform accepts that bound, so no nonce cache is kept.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default tolerance the platform allows between its clock and the skill's.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(150);

/// Freshness window policy for request timestamps.
///
/// The tolerance is explicit configuration, not a process-wide constant, so
/// tests can vary it. Comparison happens at whole-second granularity with
/// strict bounds on both sides, matching the platform's integer-second
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampPolicy {
    tolerance: Duration,
}

impl Default for TimestampPolicy {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE }
    }
}

impl TimestampPolicy {
    /// Creates a policy with the given symmetric tolerance.
    ///
    /// Sub-second precision of the tolerance is discarded.
    pub const fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    /// Returns the configured tolerance.
    pub const fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Returns whether `timestamp` is fresh relative to `now`.
    ///
    /// True iff `now - tolerance < timestamp < now + tolerance`, compared on
    /// Unix seconds with strict inequalities: a timestamp exactly at either
    /// bound is rejected. Pure function of its inputs; `now` is always
    /// injected by the caller, never read from a global clock.
    pub fn is_fresh(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let tolerance = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);
        let ts = timestamp.timestamp();
        let now = now.timestamp();

        ts < now.saturating_add(tolerance) && ts > now.saturating_sub(tolerance)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn current_timestamp_is_fresh() {
        let policy = TimestampPolicy::default();
        assert!(policy.is_fresh(fixed_now(), fixed_now()));
    }

    #[test]
    fn timestamps_inside_window_are_fresh() {
        let policy = TimestampPolicy::default();
        let now = fixed_now();

        assert!(policy.is_fresh(now + chrono::Duration::seconds(149), now));
        assert!(policy.is_fresh(now - chrono::Duration::seconds(149), now));
    }

    #[test]
    fn boundary_timestamps_are_rejected() {
        let policy = TimestampPolicy::default();
        let now = fixed_now();

        assert!(!policy.is_fresh(now + chrono::Duration::seconds(150), now));
        assert!(!policy.is_fresh(now - chrono::Duration::seconds(150), now));
    }

    #[test]
    fn timestamps_outside_window_are_rejected() {
        let policy = TimestampPolicy::default();
        let now = fixed_now();

        assert!(!policy.is_fresh(now + chrono::Duration::seconds(151), now));
        assert!(!policy.is_fresh(now - chrono::Duration::seconds(600), now));
    }

    #[test]
    fn sub_second_precision_is_discarded() {
        let policy = TimestampPolicy::default();
        let now = fixed_now();

        // 149.9s ahead truncates to 149 whole seconds: fresh.
        assert!(policy.is_fresh(now + chrono::Duration::milliseconds(149_900), now));
        // 149.9s behind floors to -150 whole seconds: on the bound, rejected.
        assert!(!policy.is_fresh(now - chrono::Duration::milliseconds(149_900), now));
    }

    #[test]
    fn custom_tolerance_is_honored() {
        let policy = TimestampPolicy::new(Duration::from_secs(10));
        let now = fixed_now();

        assert!(policy.is_fresh(now + chrono::Duration::seconds(9), now));
        assert!(!policy.is_fresh(now + chrono::Duration::seconds(10), now));
    }
}
