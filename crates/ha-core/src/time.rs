//! Wall-clock timestamps
//!
//! All persisted times are Unix epoch milliseconds. Handlers obtain the current
//! value through `PhysicalTimeEffects` so tests can drive the clock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const MS_PER_DAY: u64 = 86_400_000;

/// Unix epoch milliseconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The Unix epoch
    pub const EPOCH: Self = Self(0);

    /// Create from epoch milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from epoch seconds
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Epoch milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Epoch seconds, truncated
    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// This timestamp shifted forward, saturating at `u64::MAX`
    pub fn plus(&self, duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }

    /// This timestamp shifted backward, saturating at the epoch
    pub fn minus(&self, duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_sub(ms))
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Index of the UTC day containing this timestamp
    pub fn day_index(&self) -> u64 {
        self.0 / MS_PER_DAY
    }

    /// UTC calendar date containing this timestamp
    pub fn utc_date(&self) -> NaiveDate {
        let secs = i64::try_from(self.as_secs()).unwrap_or(i64::MAX);
        DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_and_since_are_inverse() {
        let t = Timestamp::from_secs(1_000);
        let later = t.plus(Duration::from_secs(90));
        assert_eq!(later.as_secs(), 1_090);
        assert_eq!(later.since(t), Duration::from_secs(90));
        assert_eq!(t.since(later), Duration::ZERO);
    }

    #[test]
    fn utc_date_matches_day_boundaries() {
        // 2024-03-01T23:59:59Z and 2024-03-02T00:00:00Z
        let before = Timestamp::from_secs(1_709_337_599);
        let after = Timestamp::from_secs(1_709_337_600);
        assert_eq!(before.utc_date().to_string(), "2024-03-01");
        assert_eq!(after.utc_date().to_string(), "2024-03-02");
        assert_eq!(before.day_index() + 1, after.day_index());
    }

    #[test]
    fn minus_saturates() {
        assert_eq!(
            Timestamp::from_millis(5).minus(Duration::from_secs(1)),
            Timestamp::EPOCH
        );
    }
}
