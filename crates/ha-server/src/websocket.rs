//! Notification socket
//!
//! `GET /ws?token=<access token>` upgrades to a websocket speaking the
//! `ha-realtime` protocol. The socket stays open while its session is active;
//! a revoked or expired session closes it at the next check.

use crate::extract::SocketUser;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::StreamExt;
use ha_core::{HaError, Principal};
use ha_realtime::{ServerMessage, SocketSession};
use ha_store::SessionRepository;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How often an open socket re-checks its session
pub const SESSION_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Authenticate, then upgrade
pub async fn websocket_handler(
    SocketUser(principal): SocketUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        WebSocketHandler::new(state, principal).handle_connection(socket).await;
    })
}

/// One websocket connection
pub struct WebSocketHandler {
    state: AppState,
    session: SocketSession,
}

impl WebSocketHandler {
    pub fn new(state: AppState, principal: Principal) -> Self {
        let session = SocketSession::new(state.hub.clone(), principal);
        Self { state, session }
    }

    /// Drive the connection until the client leaves or the session ends
    pub async fn handle_connection(mut self, mut socket: WebSocket) {
        let user_id = self.session.principal().user_id;
        info!(user_id = %user_id, "Socket connected");

        let mut session_check = interval(SESSION_CHECK_INTERVAL);
        session_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        session_check.tick().await;

        loop {
            tokio::select! {
                msg = socket.next() => {
                    let keep_open = match msg {
                        Some(Ok(msg)) => self.handle_message(&mut socket, msg).await,
                        Some(Err(e)) => {
                            warn!(user_id = %user_id, error = %e, "Socket error");
                            false
                        }
                        None => false,
                    };
                    if !keep_open {
                        break;
                    }
                }
                Some(notification) = self.session.next_notification() => {
                    let message = ServerMessage::Notification { notification };
                    if !send_server_message(&mut socket, &message).await {
                        break;
                    }
                }
                _ = session_check.tick() => {
                    if !self.session_active().await {
                        info!(user_id = %user_id, "Session ended, closing socket");
                        let message = ServerMessage::error(&HaError::unauthorized("session ended"));
                        send_server_message(&mut socket, &message).await;
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        self.session.close();
        info!(user_id = %user_id, "Socket closed");
    }

    /// Returns `false` when the connection should close
    async fn handle_message(&mut self, socket: &mut WebSocket, msg: Message) -> bool {
        match msg {
            Message::Text(text) => {
                let reply = self.session.handle_text(&text);
                send_server_message(socket, &reply).await
            }
            Message::Binary(data) => {
                debug!(bytes = data.len(), "Ignoring binary socket frame");
                true
            }
            Message::Ping(data) => socket.send(Message::Pong(data)).await.is_ok(),
            Message::Pong(_) => true,
            Message::Close(frame) => {
                debug!(?frame, "Client closed socket");
                false
            }
        }
    }

    async fn session_active(&self) -> bool {
        let principal = self.session.principal();
        let now = self.state.auth.now().await;
        match self.state.auth.store().get_session(principal.session_id).await {
            Ok(Some(session)) => session.is_active(now),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Session lookup failed, keeping socket open");
                true
            }
        }
    }
}

/// Returns `false` when the socket is gone
async fn send_server_message(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    match message.to_text() {
        Ok(text) => socket.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode socket message");
            true
        }
    }
}
