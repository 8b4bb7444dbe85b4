//! Flow results returned to callers

use ha_core::{HouseId, Role, SessionId, Timestamp, UserId};
use ha_store::{HouseRecord, UserRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseSummary {
    pub id: HouseId,
    pub name: String,
    pub code: String,
}

impl From<&HouseRecord> for HouseSummary {
    fn from(house: &HouseRecord) -> Self {
        Self {
            id: house.id,
            name: house.name.clone(),
            code: house.code.clone(),
        }
    }
}

/// Entry on the member selection screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: UserId,
    pub display_name: String,
    pub role: Role,
    /// Next login will go through activation
    pub needs_activation: bool,
}

impl From<&UserRecord> for MemberSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            role: user.role,
            needs_activation: user.credential.needs_activation(),
        }
    }
}

/// Result of house PIN verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseLogin {
    pub house_token: String,
    pub expires_at: Timestamp,
    pub house: HouseSummary,
    pub members: Vec<MemberSummary>,
}

/// Access/refresh pair for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub session_id: SessionId,
    pub access_token: String,
    pub access_expires_at: Timestamp,
    pub refresh_token: String,
    pub refresh_expires_at: Timestamp,
    pub user: MemberSummary,
}

/// Result of a member PIN login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginOutcome {
    Session(SessionTokens),
    /// The PIN was a valid temporary PIN; choose a personal one next
    ActivationRequired {
        activation_token: String,
        expires_at: Timestamp,
    },
}

/// A freshly issued temporary PIN, shown once to the issuing manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryPin {
    pub user_id: UserId,
    pub pin: String,
    pub expires_at: Timestamp,
}
