//! # HomeAsisstan Realtime - Layer 4: House Notifications
//!
//! Every house has one broadcast room. A connected socket joins the room of
//! its own house and receives every [`Notification`](ha_core::Notification)
//! published there.
//!
//! - [`hub`]: the rooms; implements [`NotificationSink`](ha_core::NotificationSink)
//! - [`protocol`]: JSON messages exchanged over the socket
//! - [`connection`]: per-socket state machine, independent of the transport

#![allow(missing_docs)]

pub mod connection;
pub mod hub;
pub mod protocol;

pub use connection::SocketSession;
pub use hub::{NotificationHub, Subscription, DEFAULT_ROOM_CAPACITY};
pub use protocol::{ClientMessage, ServerMessage};
