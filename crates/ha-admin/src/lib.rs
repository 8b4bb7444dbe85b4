//! # HomeAsisstan Admin - Layer 4: Admin Panel Services
//!
//! Services behind the admin panel. Every operation takes the acting
//! [`Principal`](ha_core::Principal) and filters by its house and role:
//!
//! - [`SessionAdminService`]: list, revoke and expire login sessions
//! - [`MemberService`]: create members, change roles, deactivate, reset PINs
//! - [`ActivityService`]: the house activity log and its aggregations
//! - [`HouseService`]: tenant bootstrap and house PIN changes
//! - [`AdminServices::overview`]: the admin dashboard numbers
//!
//! Mutating operations record an activity entry and publish a house
//! notification through the [`NotificationSink`](ha_core::NotificationSink)
//! effect.

#![allow(missing_docs)]

pub mod activity;
pub mod context;
pub mod houses;
pub mod members;
pub mod overview;
pub mod sessions;

pub use activity::{ActivityService, ActivitySummary, MAX_SUMMARY_LEN};
pub use context::ServiceContext;
pub use houses::{validate_house_code, CreatedHouse, HouseService};
pub use members::{CreatedMember, MemberService, MemberView};
pub use overview::HouseOverview;
pub use sessions::{SessionAdminService, SessionQuery, SessionView};

use ha_authentication::AuthService;
use std::sync::Arc;

/// All admin services over one context
#[derive(Clone)]
pub struct AdminServices {
    pub context: ServiceContext,
    pub activity: ActivityService,
    pub sessions: SessionAdminService,
    pub members: MemberService,
    pub houses: HouseService,
}

impl AdminServices {
    pub fn new(context: ServiceContext, auth: Arc<AuthService>) -> Self {
        let activity = ActivityService::new(context.clone());
        Self {
            sessions: SessionAdminService::new(context.clone(), auth.clone(), activity.clone()),
            members: MemberService::new(context.clone(), auth.clone(), activity.clone()),
            houses: HouseService::new(context.clone(), auth, activity.clone()),
            activity,
            context,
        }
    }
}

impl std::fmt::Debug for AdminServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminServices").finish_non_exhaustive()
    }
}
