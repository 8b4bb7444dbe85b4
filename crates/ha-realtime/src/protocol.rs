//! Socket wire protocol
//!
//! Text frames carrying JSON objects tagged by `type`:
//!
//! ```json
//! {"type":"join_house","houseId":"house-…"}
//! {"type":"joined","houseId":"house-…"}
//! {"type":"notification","notification":{…}}
//! ```

use ha_core::{HaError, HouseId, Notification};
use serde::{Deserialize, Serialize};

/// Messages sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a house room
    JoinHouse {
        #[serde(rename = "houseId")]
        house_id: HouseId,
    },
    /// Leave the current room
    LeaveHouse,
    /// Keepalive
    Ping,
}

impl ClientMessage {
    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self, HaError> {
        serde_json::from_str(text)
            .map_err(|e| HaError::invalid(format!("invalid socket message: {e}")))
    }
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Room joined
    Joined {
        #[serde(rename = "houseId")]
        house_id: HouseId,
    },
    /// Room left
    Left {
        #[serde(rename = "houseId")]
        house_id: HouseId,
    },
    /// Something happened in the house
    Notification {
        /// Event payload
        notification: Notification,
    },
    /// Reply to `ping`
    Pong,
    /// Request refused or malformed
    Error {
        /// Stable error code
        code: String,
        /// Human readable reason
        message: String,
    },
}

impl ServerMessage {
    /// Error frame for a failed request
    pub fn error(err: &HaError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    /// Serialize to a text frame
    pub fn to_text(&self) -> Result<String, HaError> {
        Ok(serde_json::to_string(self)?)
    }
}
