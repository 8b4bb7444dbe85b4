//! Per-socket state
//!
//! A socket is authenticated once, when it connects. Afterwards it can be in
//! at most one house room at a time; joining again moves it.

use crate::hub::{NotificationHub, Subscription};
use crate::protocol::{ClientMessage, ServerMessage};
use ha_core::{Notification, Principal};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct SocketSession {
    hub: Arc<NotificationHub>,
    principal: Principal,
    subscription: Option<Subscription>,
}

impl SocketSession {
    pub fn new(hub: Arc<NotificationHub>, principal: Principal) -> Self {
        Self {
            hub,
            principal,
            subscription: None,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn is_joined(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handle one parsed client message and produce the reply
    pub fn handle(&mut self, message: ClientMessage) -> ServerMessage {
        match message {
            ClientMessage::JoinHouse { house_id } => {
                match self.hub.join(&self.principal, house_id) {
                    Ok(subscription) => {
                        if let Some(previous) = self.subscription.replace(subscription) {
                            self.hub.leave(previous);
                        }
                        ServerMessage::Joined { house_id }
                    }
                    Err(err) => {
                        debug!(
                            user_id = %self.principal.user_id,
                            house_id = %house_id,
                            "Join refused"
                        );
                        ServerMessage::error(&err)
                    }
                }
            }
            ClientMessage::LeaveHouse => match self.subscription.take() {
                Some(subscription) => {
                    let house_id = subscription.house_id();
                    self.hub.leave(subscription);
                    ServerMessage::Left { house_id }
                }
                None => ServerMessage::Error {
                    code: "invalid".to_string(),
                    message: "not in a house room".to_string(),
                },
            },
            ClientMessage::Ping => ServerMessage::Pong,
        }
    }

    /// Parse and handle a text frame
    pub fn handle_text(&mut self, text: &str) -> ServerMessage {
        match ClientMessage::parse(text) {
            Ok(message) => self.handle(message),
            Err(err) => ServerMessage::error(&err),
        }
    }

    /// Wait for the next notification of the joined room
    ///
    /// Pends forever while no room is joined, so it can sit in a `select!`
    /// next to the socket reader.
    pub async fn next_notification(&mut self) -> Option<Notification> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Leave any joined room
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.hub.leave(subscription);
        }
    }
}

impl Drop for SocketSession {
    fn drop(&mut self) {
        self.close();
    }
}
