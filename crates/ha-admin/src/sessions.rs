//! Session administration
//!
//! Admins see every session of their house; other members see their own.
//! Sessions are only ever revoked, never deleted.

use crate::activity::ActivityService;
use crate::context::ServiceContext;
use ha_authentication::AuthService;
use ha_authorization::{can_manage, has_permission, require_permission, ScopeFilter};
use ha_core::{
    Action, HaError, Module, NotificationKind, Principal, Result, SessionId, Timestamp, UserId,
};
use ha_store::{HouseRepository, RevokeReason, SessionRecord, SessionRepository, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Session list filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionQuery {
    /// Only sessions of this member
    pub user: Option<UserId>,
    /// Include revoked and expired sessions
    pub include_inactive: bool,
}

/// A session as shown in the admin panel; never carries token material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: Timestamp,
    pub last_used_at: Timestamp,
    pub expires_at: Timestamp,
    pub active: bool,
    pub revoked_at: Option<Timestamp>,
    pub revoke_reason: Option<RevokeReason>,
    pub user_agent: Option<String>,
    /// The session making the request
    pub current: bool,
}

impl SessionView {
    fn new(record: SessionRecord, now: Timestamp, current: SessionId) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            created_at: record.created_at,
            last_used_at: record.last_used_at,
            expires_at: record.expires_at,
            active: record.is_active(now),
            revoked_at: record.revoked_at,
            revoke_reason: record.revoke_reason,
            user_agent: record.user_agent,
            current: record.id == current,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionAdminService {
    ctx: ServiceContext,
    auth: Arc<AuthService>,
    activity: ActivityService,
}

impl SessionAdminService {
    pub fn new(ctx: ServiceContext, auth: Arc<AuthService>, activity: ActivityService) -> Self {
        Self {
            ctx,
            auth,
            activity,
        }
    }

    fn is_admin(actor: &Principal) -> bool {
        has_permission(actor.role, Module::Admin, Action::View)
    }

    /// Sessions visible to `actor`, newest first
    pub async fn list_sessions(
        &self,
        actor: &Principal,
        query: &SessionQuery,
    ) -> Result<Vec<SessionView>> {
        let filter = if Self::is_admin(actor) {
            ScopeFilter {
                house_id: actor.house_id,
                owner: query.user,
            }
        } else {
            if query.user.is_some_and(|u| u != actor.user_id) {
                return Err(HaError::permission_denied(
                    "only admins can list other members' sessions",
                ));
            }
            ScopeFilter {
                house_id: actor.house_id,
                owner: Some(actor.user_id),
            }
        };
        let now = self.ctx.now().await;
        Ok(self
            .ctx
            .store
            .list_sessions(&filter)
            .await?
            .into_iter()
            .filter(|s| query.include_inactive || s.is_active(now))
            .map(|s| SessionView::new(s, now, actor.session_id))
            .collect())
    }

    /// Revoke one session; admins may revoke any in their house
    ///
    /// Returns `false` when the session was already revoked.
    pub async fn revoke_session(&self, actor: &Principal, session_id: SessionId) -> Result<bool> {
        let session = self
            .ctx
            .store
            .get_session(session_id)
            .await?
            .filter(|s| s.house_id == actor.house_id)
            .ok_or_else(|| HaError::not_found(format!("session {session_id}")))?;
        if session.user_id != actor.user_id && !Self::is_admin(actor) {
            return Err(HaError::permission_denied(
                "only admins can revoke other members' sessions",
            ));
        }

        let now = self.ctx.now().await;
        if !self
            .auth
            .revoke_session(session_id, RevokeReason::Revoked, now)
            .await?
        {
            return Ok(false);
        }
        let owner = session.user_id;
        info!(actor = %actor.user_id, session_id = %session_id, "Session revoked");

        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Security,
                Action::Delete,
                &format!("Revoked session {session_id}"),
            )
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::SessionRevoked {
                    session_id,
                    user_id: owner,
                },
                "A session was signed out",
            )
            .await;
        Ok(true)
    }

    /// Revoke every active session of a member
    ///
    /// Allowed for the member themselves and for managers above them.
    pub async fn revoke_user_sessions(&self, actor: &Principal, user_id: UserId) -> Result<usize> {
        let target = self
            .ctx
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.house_id == actor.house_id)
            .ok_or_else(|| HaError::not_found(format!("member {user_id}")))?;
        if user_id != actor.user_id {
            require_permission(actor.role, Module::Users, Action::Edit)?;
            if !can_manage(actor.role, target.role) {
                return Err(HaError::permission_denied(format!(
                    "role {} may not manage a {}",
                    actor.role, target.role
                )));
            }
        }

        let revoked = self
            .auth
            .revoke_user_sessions(actor.house_id, user_id, RevokeReason::Revoked, None)
            .await?;
        if revoked.is_empty() {
            return Ok(0);
        }
        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Security,
                Action::Delete,
                &format!(
                    "Signed out {} session(s) of {}",
                    revoked.len(),
                    target.display_name
                ),
            )
            .await?;
        for session_id in &revoked {
            self.ctx
                .publish(
                    actor.house_id,
                    Some(actor.user_id),
                    NotificationKind::SessionRevoked {
                        session_id: *session_id,
                        user_id,
                    },
                    "A session was signed out",
                )
                .await;
        }
        Ok(revoked.len())
    }

    /// Mark every session past its refresh window as revoked
    ///
    /// Runs as a background sweep; returns the number of sessions marked.
    pub async fn expire_stale(&self, now: Timestamp) -> Result<usize> {
        let mut expired = 0;
        for house in self.ctx.store.list_houses().await? {
            for session in self
                .ctx
                .store
                .list_sessions(&ScopeFilter::house(house.id))
                .await?
            {
                if session.is_revoked || now < session.expires_at {
                    continue;
                }
                if self
                    .auth
                    .revoke_session(session.id, RevokeReason::Expired, now)
                    .await?
                {
                    expired += 1;
                }
            }
        }
        if expired > 0 {
            info!(expired, "Stale sessions expired");
        }
        Ok(expired)
    }
}
