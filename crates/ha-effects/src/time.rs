//! System clock handler

use async_trait::async_trait;
use ha_core::{PhysicalTimeEffects, Timestamp};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Real time handler for production use
///
/// Stateless; delegates to the operating system clock.
#[derive(Debug, Clone, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn now(&self) -> Timestamp {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();
        Timestamp::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
    }
}
