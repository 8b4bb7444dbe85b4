//! Notification sink that remembers what it was sent

use async_trait::async_trait;
use ha_core::{HouseId, Notification, NotificationSink};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Notifications addressed to one house
    pub fn sent_to(&self, house_id: HouseId) -> Vec<Notification> {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.house_id == house_id)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().push(notification);
    }
}
