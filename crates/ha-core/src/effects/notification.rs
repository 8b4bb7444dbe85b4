//! House notification effect
//!
//! Services publish notifications through `NotificationSink` without knowing
//! about the socket layer. `ha-realtime` implements the sink by broadcasting to
//! the house room; tests record what was published.

use crate::{Action, HouseId, Module, NotificationId, Role, SessionId, Timestamp, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// An activity entry was recorded
    ActivityLogged {
        /// Module the activity belongs to
        module: Module,
        /// Action performed
        action: Action,
    },
    /// A member account was created
    MemberCreated {
        /// New member
        user_id: UserId,
        /// Assigned role
        role: Role,
    },
    /// A member's role changed
    RoleChanged {
        /// Affected member
        user_id: UserId,
        /// Previous role
        from: Role,
        /// New role
        to: Role,
    },
    /// A member account was deactivated
    MemberDeactivated {
        /// Affected member
        user_id: UserId,
    },
    /// A session was revoked
    SessionRevoked {
        /// Revoked session
        session_id: SessionId,
        /// Session owner
        user_id: UserId,
    },
    /// A temporary PIN was issued
    PinReset {
        /// Affected member
        user_id: UserId,
    },
    /// House-level settings changed
    HouseSettingsChanged,
}

/// A message pushed to every socket joined to a house room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification identifier
    pub id: NotificationId,
    /// Target house room
    pub house_id: HouseId,
    /// Member that caused it, if any
    pub actor: Option<UserId>,
    /// Event payload
    pub kind: NotificationKind,
    /// Human readable summary
    pub message: String,
    /// Creation time
    pub created_at: Timestamp,
}

impl Notification {
    /// Create a notification for a house
    pub fn new(
        house_id: HouseId,
        actor: Option<UserId>,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            house_id,
            actor,
            kind,
            message: message.into(),
            created_at,
        }
    }
}

/// Delivery of notifications to a house room
///
/// Delivery is best effort: a house with no connected sockets drops the
/// notification silently.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Publish to the notification's house room
    async fn notify(&self, notification: Notification);
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn notify(&self, notification: Notification) {
        (**self).notify(notification).await;
    }
}
