//! Wall-clock time effect

use crate::Timestamp;
use async_trait::async_trait;
use std::sync::Arc;

/// Wall-clock time for timestamps, token expiry and lockouts
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current Unix time
    async fn now(&self) -> Timestamp;
}

#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for Arc<T> {
    async fn now(&self) -> Timestamp {
        (**self).now().await
    }
}
