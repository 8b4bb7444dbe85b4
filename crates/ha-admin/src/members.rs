//! Member administration
//!
//! Managers act only on roles strictly below their own (admins on everyone),
//! and a house always keeps at least one active admin. Permission and
//! last-admin checks are repeated inside the store's atomic update, so two
//! admins demoting each other at once cannot both succeed.

use crate::activity::ActivityService;
use crate::context::ServiceContext;
use ha_authentication::{AuthService, TemporaryPin};
use ha_authorization::{can_assign, can_authenticate, can_manage, require_permission};
use ha_core::{
    Action, HaError, Module, NotificationKind, Principal, Result, Role, Timestamp, UserId,
};
use ha_store::{user_change, Credential, HouseRoster, RevokeReason, UserRecord, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Longest accepted display name, in characters
const MAX_NAME_LEN: usize = 64;

/// A member as shown in the admin panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: UserId,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    pub needs_activation: bool,
    pub created_at: Timestamp,
    pub last_login_at: Option<Timestamp>,
}

impl From<&UserRecord> for MemberView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            role: user.role,
            active: user.active,
            needs_activation: can_authenticate(user.role) && user.credential.needs_activation(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Result of creating a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMember {
    pub member: MemberView,
    /// Shown once to the creator; absent for pets
    pub temporary_pin: Option<TemporaryPin>,
}

pub(crate) fn validate_display_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HaError::invalid("display name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(HaError::invalid(format!(
            "display name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

#[derive(Debug, Clone)]
pub struct MemberService {
    ctx: ServiceContext,
    auth: Arc<AuthService>,
    activity: ActivityService,
}

impl MemberService {
    pub fn new(ctx: ServiceContext, auth: Arc<AuthService>, activity: ActivityService) -> Self {
        Self {
            ctx,
            auth,
            activity,
        }
    }

    /// Load a member of the actor's house
    async fn target(&self, actor: &Principal, user_id: UserId) -> Result<UserRecord> {
        self.ctx
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.house_id == actor.house_id)
            .ok_or_else(|| HaError::not_found(format!("member {user_id}")))
    }

    fn ensure_manages(actor: &Principal, target: &UserRecord) -> Result<()> {
        if target.house_id != actor.house_id {
            return Err(HaError::not_found(format!("member {}", target.id)));
        }
        if can_manage(actor.role, target.role) {
            Ok(())
        } else {
            Err(HaError::permission_denied(format!(
                "role {} may not manage a {}",
                actor.role, target.role
            )))
        }
    }

    /// Fail when removing `target` would leave the house without an admin
    fn ensure_not_last_admin(target: &UserRecord, roster: &HouseRoster) -> Result<()> {
        if target.active && target.role == Role::Admin && roster.other_active_admins == 0 {
            return Err(HaError::conflict("a house must keep at least one admin"));
        }
        Ok(())
    }

    /// Members of the actor's house, oldest first
    pub async fn list_members(&self, actor: &Principal) -> Result<Vec<MemberView>> {
        require_permission(actor.role, Module::Users, Action::View)?;
        Ok(self
            .ctx
            .store
            .list_users(actor.house_id)
            .await?
            .iter()
            .map(MemberView::from)
            .collect())
    }

    /// Create a member; everyone but pets gets a temporary PIN
    pub async fn create_member(
        &self,
        actor: &Principal,
        display_name: &str,
        role: Role,
    ) -> Result<CreatedMember> {
        require_permission(actor.role, Module::Users, Action::Create)?;
        if !can_assign(actor.role, role) {
            return Err(HaError::permission_denied(format!(
                "role {} may not assign {role}",
                actor.role
            )));
        }
        let display_name = validate_display_name(display_name)?;

        let id = UserId::new();
        let (temporary_pin, credential) = if can_authenticate(role) {
            let (pin, credential) = self.auth.temporary_credential(id).await?;
            (Some(pin), credential)
        } else {
            (None, Credential::None)
        };
        let user = UserRecord {
            id,
            house_id: actor.house_id,
            display_name: display_name.to_string(),
            role,
            credential,
            active: true,
            created_at: self.ctx.now().await,
            last_login_at: None,
            failed_attempts: 0,
            locked_until: None,
        };
        self.ctx.store.insert_user(user.clone()).await?;
        info!(actor = %actor.user_id, user_id = %id, role = %role, "Member created");

        let message = format!("{display_name} joined as {role}");
        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Users,
                Action::Create,
                &message,
            )
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::MemberCreated { user_id: id, role },
                message,
            )
            .await;

        Ok(CreatedMember {
            member: MemberView::from(&user),
            temporary_pin,
        })
    }

    /// Change a member's role
    ///
    /// The actor must manage both the current and the new role. Demoting the
    /// last active admin is refused.
    pub async fn update_role(
        &self,
        actor: &Principal,
        user_id: UserId,
        role: Role,
    ) -> Result<MemberView> {
        require_permission(actor.role, Module::Users, Action::Edit)?;
        let target = self.target(actor, user_id).await?;
        Self::ensure_manages(actor, &target)?;
        if !can_assign(actor.role, role) {
            return Err(HaError::permission_denied(format!(
                "role {} may not assign {role}",
                actor.role
            )));
        }
        if target.role == role {
            return Ok(MemberView::from(&target));
        }

        let mut changed_from = None;
        let target = self
            .ctx
            .store
            .modify_user(
                user_id,
                user_change(|u, roster| {
                    Self::ensure_manages(actor, u)?;
                    if u.role == role {
                        return Ok(());
                    }
                    if role != Role::Admin {
                        Self::ensure_not_last_admin(u, roster)?;
                    }
                    // Pets hold no PIN; a promoted pet gets one through reset_pin
                    if !can_authenticate(role) || !can_authenticate(u.role) {
                        u.credential = Credential::None;
                    }
                    changed_from = Some(u.role);
                    u.role = role;
                    Ok(())
                }),
            )
            .await?;
        let Some(previous) = changed_from else {
            return Ok(MemberView::from(&target));
        };
        if !can_authenticate(role) {
            self.auth
                .revoke_user_sessions(actor.house_id, user_id, RevokeReason::Revoked, None)
                .await?;
        }
        info!(
            actor = %actor.user_id,
            user_id = %user_id,
            from = %previous,
            to = %role,
            "Role changed"
        );

        let message = format!("{} is now {role}", target.display_name);
        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Users,
                Action::Edit,
                &message,
            )
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::RoleChanged {
                    user_id,
                    from: previous,
                    to: role,
                },
                message,
            )
            .await;
        Ok(MemberView::from(&target))
    }

    /// Deactivate a member and end their sessions
    ///
    /// The record stays for the activity history. Deactivating the last
    /// active admin is refused.
    pub async fn deactivate_member(
        &self,
        actor: &Principal,
        user_id: UserId,
    ) -> Result<MemberView> {
        require_permission(actor.role, Module::Users, Action::Delete)?;
        let target = self.target(actor, user_id).await?;
        Self::ensure_manages(actor, &target)?;
        if !target.active {
            return Ok(MemberView::from(&target));
        }

        let mut deactivated = false;
        let target = self
            .ctx
            .store
            .modify_user(
                user_id,
                user_change(|u, roster| {
                    Self::ensure_manages(actor, u)?;
                    if !u.active {
                        return Ok(());
                    }
                    Self::ensure_not_last_admin(u, roster)?;
                    u.active = false;
                    deactivated = true;
                    Ok(())
                }),
            )
            .await?;
        if !deactivated {
            return Ok(MemberView::from(&target));
        }
        let revoked = self
            .auth
            .revoke_user_sessions(
                actor.house_id,
                user_id,
                RevokeReason::MemberDeactivated,
                None,
            )
            .await?;
        info!(
            actor = %actor.user_id,
            user_id = %user_id,
            sessions = revoked.len(),
            "Member deactivated"
        );

        let message = format!("{} was deactivated", target.display_name);
        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Users,
                Action::Delete,
                &message,
            )
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::MemberDeactivated { user_id },
                message,
            )
            .await;
        Ok(MemberView::from(&target))
    }

    /// Issue a new temporary PIN; the member must activate again
    pub async fn reset_pin(&self, actor: &Principal, user_id: UserId) -> Result<TemporaryPin> {
        let issued = self.auth.issue_temporary_pin(actor, user_id).await?;
        let target = self.target(actor, user_id).await?;

        let message = format!("PIN reset for {}", target.display_name);
        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Users,
                Action::Edit,
                &message,
            )
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::PinReset { user_id },
                message,
            )
            .await;
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_rules() {
        assert_eq!(validate_display_name("  Ana ").unwrap(), "Ana");
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_display_name(&"é".repeat(MAX_NAME_LEN)).is_ok());
    }
}
