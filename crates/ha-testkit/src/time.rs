//! Controllable clock

use async_trait::async_trait;
use ha_core::{PhysicalTimeEffects, Timestamp};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Clock that only moves when a test moves it
#[derive(Debug, Clone)]
pub struct ControllableTime {
    current: Arc<Mutex<Timestamp>>,
}

impl ControllableTime {
    /// Start at `initial`
    pub fn new(initial: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
        }
    }

    /// Start at 2024-01-01T00:00:00Z
    pub fn at_fixed_epoch() -> Self {
        Self::new(Timestamp::from_secs(1_704_067_200))
    }

    /// Advance by a duration
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current = current.plus(by);
    }

    /// Advance by whole seconds
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Set absolute time
    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }

    pub fn current(&self) -> Timestamp {
        *self.current.lock()
    }
}

impl Default for ControllableTime {
    fn default() -> Self {
        Self::at_fixed_epoch()
    }
}

#[async_trait]
impl PhysicalTimeEffects for ControllableTime {
    async fn now(&self) -> Timestamp {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_time_moves_only_when_told() {
        let time = ControllableTime::new(Timestamp::from_secs(100));
        assert_eq!(time.now().await, Timestamp::from_secs(100));
        time.advance_secs(5);
        assert_eq!(time.now().await, Timestamp::from_secs(105));
        time.set(Timestamp::from_secs(10));
        assert_eq!(time.now().await.as_secs(), 10);
    }

    #[tokio::test]
    async fn test_clones_share_the_clock() {
        let time = ControllableTime::default();
        let other = time.clone();
        other.advance(Duration::from_millis(1_500));
        assert_eq!(time.current(), other.current());
    }
}
