//! House rooms
//!
//! One `tokio::sync::broadcast` channel per house, created on first join and
//! dropped when its last subscriber leaves. Publishing to a house nobody
//! listens to is a no-op.

use async_trait::async_trait;
use ha_core::{HouseId, Notification, NotificationSink, Principal, Result, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Notifications buffered per room before slow subscribers start lagging
pub const DEFAULT_ROOM_CAPACITY: usize = 64;

/// Broadcast rooms keyed by house
#[derive(Debug)]
pub struct NotificationHub {
    rooms: RwLock<HashMap<HouseId, broadcast::Sender<Notification>>>,
    capacity: usize,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe `principal` to the room of `house_id`
    ///
    /// Members may only join the room of their own house.
    pub fn join(&self, principal: &Principal, house_id: HouseId) -> Result<Subscription> {
        principal.ensure_house(house_id)?;
        let receiver = {
            let mut rooms = self.rooms.write();
            rooms
                .entry(house_id)
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };
        debug!(house_id = %house_id, user_id = %principal.user_id, "Joined house room");
        Ok(Subscription {
            house_id,
            user_id: principal.user_id,
            receiver,
        })
    }

    /// Drop a subscription; removes the room once it is empty
    pub fn leave(&self, subscription: Subscription) {
        let Subscription {
            house_id,
            user_id,
            receiver,
        } = subscription;
        drop(receiver);
        let mut rooms = self.rooms.write();
        if rooms
            .get(&house_id)
            .is_some_and(|room| room.receiver_count() == 0)
        {
            rooms.remove(&house_id);
        }
        debug!(house_id = %house_id, user_id = %user_id, "Left house room");
    }

    /// Broadcast to the notification's house; returns how many subscribers got it
    pub fn publish(&self, notification: Notification) -> usize {
        let house_id = notification.house_id;
        let rooms = self.rooms.read();
        match rooms.get(&house_id) {
            Some(room) => room.send(notification).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of houses with at least one subscriber
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Subscribers currently in a house room
    pub fn subscriber_count(&self, house_id: HouseId) -> usize {
        self.rooms
            .read()
            .get(&house_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

#[async_trait]
impl NotificationSink for NotificationHub {
    async fn notify(&self, notification: Notification) {
        let house_id = notification.house_id;
        let delivered = self.publish(notification);
        debug!(house_id = %house_id, delivered, "Notification published");
    }
}

/// Membership in one house room
#[derive(Debug)]
pub struct Subscription {
    house_id: HouseId,
    user_id: UserId,
    receiver: broadcast::Receiver<Notification>,
}

impl Subscription {
    pub fn house_id(&self) -> HouseId {
        self.house_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Next notification for this room
    ///
    /// Skips over notifications lost to lag. Returns `None` once the room is
    /// gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        house_id = %self.house_id,
                        user_id = %self.user_id,
                        skipped,
                        "Subscriber lagged"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
