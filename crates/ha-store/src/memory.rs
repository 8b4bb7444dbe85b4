//! In-memory storage backend
//!
//! Used by the server until a database-backed store is wired in, and by every
//! test. Each aggregate sits behind its own `RwLock` so readers never block
//! each other; `modify_*` closures run while the write guard is held.

use crate::records::{
    ActivityQuery, ActivityRecord, HouseRecord, HouseRoster, SessionRecord, UserRecord,
};
use crate::traits::{
    ActivityRepository, HouseChange, HouseRepository, SessionChange, SessionRepository,
    UsedTokenRepository, UserChange, UserRepository,
};
use async_trait::async_trait;
use ha_authorization::ScopeFilter;
use ha_core::{HaError, HouseId, Result, Role, SessionId, Timestamp, UserId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    houses: RwLock<HashMap<HouseId, HouseRecord>>,
    users: RwLock<HashMap<UserId, UserRecord>>,
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    activity: RwLock<Vec<ActivityRecord>>,
    used_tokens: RwLock<HashMap<String, Timestamp>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HouseRepository for MemoryStore {
    async fn insert_house(&self, house: HouseRecord) -> Result<()> {
        let mut houses = self.houses.write().await;
        if houses
            .values()
            .any(|h| h.code.eq_ignore_ascii_case(&house.code))
        {
            return Err(HaError::conflict(format!(
                "house code {} is taken",
                house.code
            )));
        }
        if houses.contains_key(&house.id) {
            return Err(HaError::conflict(format!("{} already exists", house.id)));
        }
        tracing::debug!(house_id = %house.id, code = %house.code, "house stored");
        houses.insert(house.id, house);
        Ok(())
    }

    async fn get_house(&self, id: HouseId) -> Result<Option<HouseRecord>> {
        Ok(self.houses.read().await.get(&id).cloned())
    }

    async fn list_houses(&self) -> Result<Vec<HouseRecord>> {
        let mut houses: Vec<HouseRecord> = self.houses.read().await.values().cloned().collect();
        houses.sort_by_key(|h| (h.created_at, h.id));
        Ok(houses)
    }

    async fn find_house_by_code(&self, code: &str) -> Result<Option<HouseRecord>> {
        let houses = self.houses.read().await;
        Ok(houses
            .values()
            .find(|h| h.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn modify_house(&self, id: HouseId, change: HouseChange<'_>) -> Result<HouseRecord> {
        let mut houses = self.houses.write().await;
        let slot = houses
            .get_mut(&id)
            .ok_or_else(|| HaError::not_found(id.to_string()))?;
        let mut updated = slot.clone();
        change(&mut updated)?;
        *slot = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(HaError::conflict(format!("{} already exists", user.id)));
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_users(&self, house_id: HouseId) -> Result<Vec<UserRecord>> {
        let users = self.users.read().await;
        let mut members: Vec<UserRecord> = users
            .values()
            .filter(|u| u.house_id == house_id)
            .cloned()
            .collect();
        members.sort_by_key(|u| (u.created_at, u.id));
        Ok(members)
    }

    async fn modify_user(&self, id: UserId, change: UserChange<'_>) -> Result<UserRecord> {
        let mut users = self.users.write().await;
        let mut updated = users
            .get(&id)
            .cloned()
            .ok_or_else(|| HaError::not_found(id.to_string()))?;
        let roster = HouseRoster {
            other_active_admins: users
                .values()
                .filter(|u| u.house_id == updated.house_id && u.id != id)
                .filter(|u| u.active && u.role == Role::Admin)
                .count(),
        };
        change(&mut updated, &roster)?;
        users.insert(id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(&self, session: SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(HaError::conflict(format!("{} already exists", session.id)));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn modify_session(
        &self,
        id: SessionId,
        change: SessionChange<'_>,
    ) -> Result<SessionRecord> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&id)
            .ok_or_else(|| HaError::not_found(id.to_string()))?;
        let mut updated = slot.clone();
        change(&mut updated)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn list_sessions(&self, filter: &ScopeFilter) -> Result<Vec<SessionRecord>> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<SessionRecord> = sessions
            .values()
            .filter(|s| filter.matches(*s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn append_activity(&self, entry: ActivityRecord) -> Result<()> {
        self.activity.write().await.push(entry);
        Ok(())
    }

    async fn query_activity(
        &self,
        filter: &ScopeFilter,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>> {
        let activity = self.activity.read().await;
        let mut matching: Vec<ActivityRecord> = activity
            .iter()
            .filter(|a| filter.matches(*a) && query.matches(a))
            .cloned()
            .collect();
        // Stable sort keeps append order among equal timestamps; reverse for newest first.
        matching.sort_by_key(|a| a.created_at);
        matching.reverse();
        let page = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(page)
    }
}

#[async_trait]
impl UsedTokenRepository for MemoryStore {
    async fn consume_token(&self, jti: &str, expires_at: Timestamp) -> Result<bool> {
        let mut used = self.used_tokens.write().await;
        if used.contains_key(jti) {
            return Ok(false);
        }
        used.insert(jti.to_string(), expires_at);
        Ok(true)
    }

    async fn purge_used_tokens(&self, now: Timestamp) -> Result<usize> {
        let mut used = self.used_tokens.write().await;
        let before = used.len();
        used.retain(|_, expires_at| *expires_at > now);
        Ok(before - used.len())
    }
}
