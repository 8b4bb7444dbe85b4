//! House bootstrap and house settings

use crate::activity::ActivityService;
use crate::context::ServiceContext;
use crate::members::{validate_display_name, MemberView};
use ha_authentication::{validate_personal_pin, AuthService, HouseSummary, TemporaryPin};
use ha_authorization::require_permission;
use ha_core::{
    Action, HaError, HouseId, Module, NotificationKind, Principal, Result, Role, UserId,
};
use ha_store::{house_change, HouseRecord, HouseRepository, UserRecord, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 32;

/// House codes: 3 to 32 of `a-z`, `0-9`, `-`
pub fn validate_house_code(code: &str) -> Result<()> {
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len()) {
        return Err(HaError::invalid(format!(
            "house code must have {MIN_CODE_LEN} to {MAX_CODE_LEN} characters"
        )));
    }
    if !code
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(HaError::invalid(
            "house code may only contain a-z, 0-9 and '-'",
        ));
    }
    Ok(())
}

/// A freshly bootstrapped house
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedHouse {
    pub house: HouseSummary,
    pub admin: MemberView,
    /// The first admin's temporary PIN, shown once
    pub temporary_pin: TemporaryPin,
}

#[derive(Debug, Clone)]
pub struct HouseService {
    ctx: ServiceContext,
    auth: Arc<AuthService>,
    activity: ActivityService,
}

impl HouseService {
    pub fn new(ctx: ServiceContext, auth: Arc<AuthService>, activity: ActivityService) -> Self {
        Self {
            ctx,
            auth,
            activity,
        }
    }

    /// Create a house and its first admin
    ///
    /// Fails with `Conflict` when the code is taken.
    pub async fn create_house(
        &self,
        name: &str,
        code: &str,
        house_pin: &str,
        admin_name: &str,
    ) -> Result<CreatedHouse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HaError::invalid("house name must not be empty"));
        }
        let code = code.trim().to_ascii_lowercase();
        validate_house_code(&code)?;
        validate_personal_pin(house_pin)?;
        let admin_name = validate_display_name(admin_name)?;

        let now = self.ctx.now().await;
        let house = HouseRecord {
            id: HouseId::new(),
            name: name.to_string(),
            code,
            pin_hash: self.auth.hash_pin(house_pin).await?,
            created_at: now,
            failed_attempts: 0,
            locked_until: None,
        };
        self.ctx.store.insert_house(house.clone()).await?;

        let admin_id = UserId::new();
        let (temporary_pin, credential) = self.auth.temporary_credential(admin_id).await?;
        let admin = UserRecord {
            id: admin_id,
            house_id: house.id,
            display_name: admin_name.to_string(),
            role: Role::Admin,
            credential,
            active: true,
            created_at: now,
            last_login_at: None,
            failed_attempts: 0,
            locked_until: None,
        };
        self.ctx.store.insert_user(admin.clone()).await?;
        info!(house_id = %house.id, code = %house.code, "House created");

        self.activity
            .log(
                house.id,
                None,
                Module::Settings,
                Action::Create,
                &format!("House {} created", house.name),
            )
            .await?;

        Ok(CreatedHouse {
            house: HouseSummary::from(&house),
            admin: MemberView::from(&admin),
            temporary_pin,
        })
    }

    /// The actor's house
    pub async fn get_house(&self, actor: &Principal) -> Result<HouseSummary> {
        let house = self.load(actor).await?;
        Ok(HouseSummary::from(&house))
    }

    async fn load(&self, actor: &Principal) -> Result<HouseRecord> {
        self.ctx
            .store
            .get_house(actor.house_id)
            .await?
            .ok_or_else(|| HaError::not_found(actor.house_id.to_string()))
    }

    /// Replace the shared house PIN; clears any house lockout
    pub async fn change_house_pin(&self, actor: &Principal, new_pin: &str) -> Result<()> {
        require_permission(actor.role, Module::Settings, Action::Manage)?;
        validate_personal_pin(new_pin)?;
        let pin_hash = self.auth.hash_pin(new_pin).await?;
        self.ctx
            .store
            .modify_house(
                actor.house_id,
                house_change(|h| {
                    h.pin_hash = pin_hash;
                    h.failed_attempts = 0;
                    h.locked_until = None;
                    Ok(())
                }),
            )
            .await?;
        info!(actor = %actor.user_id, house_id = %actor.house_id, "House PIN changed");

        let message = "House PIN changed";
        self.activity
            .log(
                actor.house_id,
                Some(actor.user_id),
                Module::Settings,
                Action::Manage,
                message,
            )
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::HouseSettingsChanged,
                message,
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_code_rules() {
        assert!(validate_house_code("casa-123").is_ok());
        assert!(validate_house_code("abc").is_ok());
        assert!(validate_house_code("ab").is_err());
        assert!(validate_house_code(&"a".repeat(33)).is_err());
        assert!(validate_house_code("Casa").is_err());
        assert!(validate_house_code("casa_1").is_err());
        assert!(validate_house_code("casa 1").is_err());
    }
}
