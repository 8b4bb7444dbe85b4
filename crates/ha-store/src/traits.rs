//! Repository traits
//!
//! One trait per aggregate. Implementations must enforce uniqueness of house
//! codes and must never hard-delete sessions.
//!
//! Existing records are changed through `modify_*`: the closure sees the
//! current record and runs under the backend's write lock (or transaction), so
//! concurrent changes to one record never overwrite each other. A closure that
//! returns an error leaves the record untouched.

use crate::records::{
    ActivityQuery, ActivityRecord, HouseRecord, HouseRoster, SessionRecord, UserRecord,
};
use async_trait::async_trait;
use ha_authorization::ScopeFilter;
use ha_core::{HouseId, Result, SessionId, Timestamp, UserId};

/// Atomic change to a house
pub type HouseChange<'a> = Box<dyn FnOnce(&mut HouseRecord) -> Result<()> + Send + 'a>;

/// Atomic change to a member; the roster is read under the same lock
pub type UserChange<'a> = Box<dyn FnOnce(&mut UserRecord, &HouseRoster) -> Result<()> + Send + 'a>;

/// Atomic change to a session
pub type SessionChange<'a> = Box<dyn FnOnce(&mut SessionRecord) -> Result<()> + Send + 'a>;

pub fn house_change<'a>(
    change: impl FnOnce(&mut HouseRecord) -> Result<()> + Send + 'a,
) -> HouseChange<'a> {
    Box::new(change)
}

pub fn user_change<'a>(
    change: impl FnOnce(&mut UserRecord, &HouseRoster) -> Result<()> + Send + 'a,
) -> UserChange<'a> {
    Box::new(change)
}

pub fn session_change<'a>(
    change: impl FnOnce(&mut SessionRecord) -> Result<()> + Send + 'a,
) -> SessionChange<'a> {
    Box::new(change)
}

#[async_trait]
pub trait HouseRepository: Send + Sync {
    /// Fails with `Conflict` when the code is taken
    async fn insert_house(&self, house: HouseRecord) -> Result<()>;
    async fn get_house(&self, id: HouseId) -> Result<Option<HouseRecord>>;
    /// All houses, oldest first
    async fn list_houses(&self) -> Result<Vec<HouseRecord>>;
    /// Codes are matched case-insensitively
    async fn find_house_by_code(&self, code: &str) -> Result<Option<HouseRecord>>;
    /// Apply `change` atomically and return the stored result
    ///
    /// Fails with `NotFound` for unknown houses.
    async fn modify_house(&self, id: HouseId, change: HouseChange<'_>) -> Result<HouseRecord>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: UserRecord) -> Result<()>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>>;
    /// Members of one house, oldest first
    async fn list_users(&self, house_id: HouseId) -> Result<Vec<UserRecord>>;
    /// Apply `change` atomically and return the stored result
    ///
    /// Fails with `NotFound` for unknown members.
    async fn modify_user(&self, id: UserId, change: UserChange<'_>) -> Result<UserRecord>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, session: SessionRecord) -> Result<()>;
    async fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>>;
    /// Apply `change` atomically and return the stored result
    ///
    /// Fails with `NotFound` for unknown sessions.
    async fn modify_session(
        &self,
        id: SessionId,
        change: SessionChange<'_>,
    ) -> Result<SessionRecord>;
    /// Sessions passing the filter, newest first
    async fn list_sessions(&self, filter: &ScopeFilter) -> Result<Vec<SessionRecord>>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn append_activity(&self, entry: ActivityRecord) -> Result<()>;
    /// Entries passing both filter and query, newest first, paged
    async fn query_activity(
        &self,
        filter: &ScopeFilter,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>>;
}

/// Ledger of consumed one-time token ids
#[async_trait]
pub trait UsedTokenRepository: Send + Sync {
    /// Record `jti` as used; `false` if it was already recorded
    async fn consume_token(&self, jti: &str, expires_at: Timestamp) -> Result<bool>;
    /// Forget ids whose token can no longer be presented anyway
    async fn purge_used_tokens(&self, now: Timestamp) -> Result<usize>;
}

/// Everything the services need from persistence
pub trait Store:
    HouseRepository + UserRepository + SessionRepository + ActivityRepository + UsedTokenRepository
{
}

impl<T> Store for T where
    T: HouseRepository
        + UserRepository
        + SessionRepository
        + ActivityRepository
        + UsedTokenRepository
{
}
