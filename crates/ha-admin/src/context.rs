//! Shared dependencies of the admin services

use ha_core::{
    HouseId, Notification, NotificationKind, NotificationSink, PhysicalTimeEffects, Timestamp,
    UserId,
};
use ha_store::Store;
use std::sync::Arc;

/// Store and effects every admin service needs
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn Store>,
    pub time: Arc<dyn PhysicalTimeEffects>,
    pub notifier: Arc<dyn NotificationSink>,
}

impl ServiceContext {
    pub fn new(
        store: Arc<dyn Store>,
        time: Arc<dyn PhysicalTimeEffects>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            time,
            notifier,
        }
    }

    pub async fn now(&self) -> Timestamp {
        self.time.now().await
    }

    /// Push a notification to the house room
    pub async fn publish(
        &self,
        house_id: HouseId,
        actor: Option<UserId>,
        kind: NotificationKind,
        message: impl Into<String>,
    ) {
        let notification = Notification::new(house_id, actor, kind, message, self.now().await);
        tracing::debug!(
            house_id = %house_id,
            notification_id = %notification.id,
            "Publishing notification"
        );
        self.notifier.notify(notification).await;
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext").finish_non_exhaustive()
    }
}
