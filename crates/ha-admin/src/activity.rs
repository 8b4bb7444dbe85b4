//! Activity log
//!
//! Admins and responsibles read the whole house log; everyone else reads only
//! the entries they caused.

use crate::context::ServiceContext;
use chrono::NaiveDate;
use ha_authorization::{data_scope, has_permission, require_permission, DataScope, ScopeFilter};
use ha_core::{
    Action, ActivityId, HaError, HouseId, Module, NotificationKind, Principal, Result, Timestamp,
    UserId,
};
use ha_store::{ActivityQuery, ActivityRecord, ActivityRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Longest accepted activity summary, in characters
pub const MAX_SUMMARY_LEN: usize = 280;

/// Activity totals over a time window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total: usize,
    pub by_module: BTreeMap<Module, usize>,
    /// Keyed by member; system entries are not attributed
    pub by_user: BTreeMap<UserId, usize>,
    /// Keyed by UTC calendar day
    pub by_day: BTreeMap<NaiveDate, usize>,
}

impl ActivitySummary {
    fn add(&mut self, record: &ActivityRecord) {
        self.total += 1;
        *self.by_module.entry(record.module).or_default() += 1;
        if let Some(user) = record.user_id {
            *self.by_user.entry(user).or_default() += 1;
        }
        *self.by_day.entry(record.created_at.utc_date()).or_default() += 1;
    }
}

#[derive(Debug, Clone)]
pub struct ActivityService {
    ctx: ServiceContext,
}

impl ActivityService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Filter for what `actor` may read from the log
    fn filter_for(actor: &Principal) -> ScopeFilter {
        let house_wide = has_permission(actor.role, Module::Activity, Action::View)
            && data_scope(actor.role, Module::Activity) == DataScope::House;
        ScopeFilter {
            house_id: actor.house_id,
            owner: (!house_wide).then_some(actor.user_id),
        }
    }

    /// Record that `actor` performed `action` on `module`
    ///
    /// The actor must hold the permission being recorded.
    pub async fn record(
        &self,
        actor: &Principal,
        module: Module,
        action: Action,
        summary: &str,
    ) -> Result<ActivityRecord> {
        require_permission(actor.role, module, action)?;
        let entry = self
            .log(actor.house_id, Some(actor.user_id), module, action, summary)
            .await?;
        self.ctx
            .publish(
                actor.house_id,
                Some(actor.user_id),
                NotificationKind::ActivityLogged { module, action },
                entry.summary.clone(),
            )
            .await;
        Ok(entry)
    }

    /// Append an entry without permission checks or notification
    ///
    /// Used by the other admin services, which publish their own notification.
    pub(crate) async fn log(
        &self,
        house_id: HouseId,
        user_id: Option<UserId>,
        module: Module,
        action: Action,
        summary: &str,
    ) -> Result<ActivityRecord> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(HaError::invalid("activity summary must not be empty"));
        }
        if summary.chars().count() > MAX_SUMMARY_LEN {
            return Err(HaError::invalid(format!(
                "activity summary exceeds {MAX_SUMMARY_LEN} characters"
            )));
        }
        let entry = ActivityRecord {
            id: ActivityId::new(),
            house_id,
            user_id,
            module,
            action,
            summary: summary.to_string(),
            created_at: self.ctx.now().await,
        };
        self.ctx.store.append_activity(entry.clone()).await?;
        debug!(house_id = %house_id, module = %module, action = %action, "Activity recorded");
        Ok(entry)
    }

    /// Entries visible to `actor`, newest first
    pub async fn list(
        &self,
        actor: &Principal,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>> {
        let filter = Self::filter_for(actor);
        self.ctx.store.query_activity(&filter, query).await
    }

    /// Totals by module, member and UTC day for entries at or after `since`
    pub async fn summary(
        &self,
        actor: &Principal,
        since: Option<Timestamp>,
    ) -> Result<ActivitySummary> {
        let query = ActivityQuery {
            since,
            ..ActivityQuery::default()
        };
        let mut summary = ActivitySummary::default();
        for record in self.list(actor, &query).await? {
            summary.add(&record);
        }
        Ok(summary)
    }
}
