//! Admin dashboard numbers

use crate::AdminServices;
use ha_authentication::HouseSummary;
use ha_authorization::{can_authenticate, require_permission, ScopeFilter};
use ha_core::{Action, Module, Principal, Result, Role};
use ha_store::{ActivityQuery, ActivityRecord, SessionRepository, UserRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entries shown in the overview's recent-activity list
const RECENT_ACTIVITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseOverview {
    pub house: HouseSummary,
    /// Active members per role
    pub members_by_role: BTreeMap<Role, usize>,
    pub active_members: usize,
    pub inactive_members: usize,
    /// Active members still holding a temporary PIN or none at all
    pub pending_activation: usize,
    pub active_sessions: usize,
    pub recent_activity: Vec<ActivityRecord>,
}

impl AdminServices {
    /// House-wide numbers for the admin dashboard; admins only
    pub async fn overview(&self, actor: &Principal) -> Result<HouseOverview> {
        require_permission(actor.role, Module::Admin, Action::View)?;
        let store = &self.context.store;
        let house = self.houses.get_house(actor).await?;
        let now = self.context.now().await;

        let mut members_by_role = BTreeMap::new();
        let mut active_members = 0;
        let mut inactive_members = 0;
        let mut pending_activation = 0;
        for user in store.list_users(actor.house_id).await? {
            if !user.active {
                inactive_members += 1;
                continue;
            }
            active_members += 1;
            *members_by_role.entry(user.role).or_insert(0) += 1;
            if can_authenticate(user.role) && user.credential.needs_activation() {
                pending_activation += 1;
            }
        }

        let active_sessions = store
            .list_sessions(&ScopeFilter::house(actor.house_id))
            .await?
            .iter()
            .filter(|s| s.is_active(now))
            .count();
        let recent_activity = self
            .activity
            .list(
                actor,
                &ActivityQuery {
                    limit: Some(RECENT_ACTIVITY),
                    ..ActivityQuery::default()
                },
            )
            .await?;

        Ok(HouseOverview {
            house,
            members_by_role,
            active_members,
            inactive_members,
            pending_activation,
            active_sessions,
            recent_activity,
        })
    }
}
