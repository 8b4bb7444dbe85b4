//! Persisted record types

use ha_authorization::Scoped;
use ha_core::{Action, ActivityId, HouseId, Module, Role, SessionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Salted PIN digest as stored; hashing lives in `ha-authentication`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinHash {
    /// Hex-encoded random salt
    pub salt: String,
    /// Hex-encoded digest
    pub digest: String,
}

/// A house (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRecord {
    pub id: HouseId,
    pub name: String,
    /// Unique login code typed on the house PIN screen
    pub code: String,
    pub pin_hash: PinHash,
    pub created_at: Timestamp,
    /// Consecutive wrong house PINs
    pub failed_attempts: u32,
    pub locked_until: Option<Timestamp>,
}

/// How a member proves identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Credential {
    /// No PIN; pet profiles and members awaiting a temporary PIN
    None,
    /// Issued out of band by a manager; must be exchanged for a personal PIN
    Temporary {
        pin_hash: PinHash,
        expires_at: Timestamp,
    },
    /// Chosen by the member during activation
    Personal { pin_hash: PinHash },
}

impl Credential {
    /// Whether the next login must go through activation
    pub fn needs_activation(&self) -> bool {
        !matches!(self, Credential::Personal { .. })
    }
}

/// A member account within a house
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub house_id: HouseId,
    pub display_name: String,
    pub role: Role,
    pub credential: Credential,
    /// Deactivated members keep their history but cannot log in
    pub active: bool,
    pub created_at: Timestamp,
    pub last_login_at: Option<Timestamp>,
    /// Consecutive wrong personal PINs
    pub failed_attempts: u32,
    pub locked_until: Option<Timestamp>,
}

/// The rest of a member's house, seen under the same lock as a change to them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HouseRoster {
    /// Active admins other than the member being changed
    pub other_active_admins: usize,
}

impl Scoped for UserRecord {
    fn house_id(&self) -> HouseId {
        self.house_id
    }

    fn owners(&self) -> Vec<UserId> {
        vec![self.id]
    }
}

/// Why a session stopped being usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeReason {
    Logout,
    /// Revoked from the admin panel or by the owner from another device
    Revoked,
    /// A superseded refresh token was presented
    RefreshReuse,
    Expired,
    MemberDeactivated,
    PinChanged,
}

/// A login session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub house_id: HouseId,
    pub user_id: UserId,
    pub created_at: Timestamp,
    pub last_used_at: Timestamp,
    /// End of the refresh window
    pub expires_at: Timestamp,
    /// Hex SHA-256 of the current refresh token; earlier ones are superseded
    pub refresh_digest: String,
    /// Incremented on every rotation
    pub generation: u32,
    pub is_revoked: bool,
    pub revoked_at: Option<Timestamp>,
    pub revoke_reason: Option<RevokeReason>,
    pub user_agent: Option<String>,
}

impl SessionRecord {
    /// Not revoked and not past `expires_at`
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.is_revoked && now < self.expires_at
    }

    /// Soft-delete; a no-op if already revoked
    pub fn revoke(&mut self, reason: RevokeReason, now: Timestamp) -> bool {
        if self.is_revoked {
            return false;
        }
        self.is_revoked = true;
        self.revoked_at = Some(now);
        self.revoke_reason = Some(reason);
        true
    }
}

impl Scoped for SessionRecord {
    fn house_id(&self) -> HouseId {
        self.house_id
    }

    fn owners(&self) -> Vec<UserId> {
        vec![self.user_id]
    }
}

/// An activity log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub house_id: HouseId,
    /// `None` for system entries
    pub user_id: Option<UserId>,
    pub module: Module,
    pub action: Action,
    pub summary: String,
    pub created_at: Timestamp,
}

impl Scoped for ActivityRecord {
    fn house_id(&self) -> HouseId {
        self.house_id
    }

    fn owners(&self) -> Vec<UserId> {
        self.user_id.into_iter().collect()
    }
}

/// Activity log query; results are newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityQuery {
    pub module: Option<Module>,
    pub user: Option<UserId>,
    /// Inclusive lower bound
    pub since: Option<Timestamp>,
    /// Exclusive upper bound
    pub until: Option<Timestamp>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ActivityQuery {
    /// Whether an entry satisfies the non-paging criteria
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.module.map_or(true, |m| record.module == m)
            && self.user.map_or(true, |u| record.user_id == Some(u))
            && self.since.map_or(true, |t| record.created_at >= t)
            && self.until.map_or(true, |t| record.created_at < t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionRecord {
        SessionRecord {
            id: SessionId::new(),
            house_id: HouseId::new(),
            user_id: UserId::new(),
            created_at: Timestamp::from_secs(10),
            last_used_at: Timestamp::from_secs(10),
            expires_at: Timestamp::from_secs(100),
            refresh_digest: String::new(),
            generation: 0,
            is_revoked: false,
            revoked_at: None,
            revoke_reason: None,
            user_agent: None,
        }
    }

    #[test]
    fn revoke_is_soft_and_idempotent() {
        let mut s = session();
        assert!(s.is_active(Timestamp::from_secs(50)));
        assert!(s.revoke(RevokeReason::Logout, Timestamp::from_secs(60)));
        assert!(!s.revoke(RevokeReason::Revoked, Timestamp::from_secs(70)));
        assert_eq!(s.revoke_reason, Some(RevokeReason::Logout));
        assert_eq!(s.revoked_at, Some(Timestamp::from_secs(60)));
        assert!(!s.is_active(Timestamp::from_secs(61)));
    }

    #[test]
    fn session_expires() {
        let s = session();
        assert!(!s.is_active(Timestamp::from_secs(100)));
    }

    #[test]
    fn temporary_credential_needs_activation() {
        let pin_hash = PinHash {
            salt: "00".into(),
            digest: "11".into(),
        };
        assert!(Credential::Temporary {
            pin_hash: pin_hash.clone(),
            expires_at: Timestamp::EPOCH
        }
        .needs_activation());
        assert!(!Credential::Personal { pin_hash }.needs_activation());
    }
}
