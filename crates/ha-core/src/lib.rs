//! # HomeAsisstan Core - Layer 1: Foundation
//!
//! Shared vocabulary for every other crate in the workspace:
//!
//! - **Identifiers**: `HouseId`, `UserId`, `SessionId`, `ActivityId`
//! - **Access vocabulary**: `Role`, `Module`, `Action`
//! - **Principal**: the authenticated caller that every service receives
//! - **Errors**: the unified `HaError` and `Result` alias
//! - **Effects**: async traits for time, randomness and notifications
//!
//! This crate contains no policy. The permission matrix and role hierarchy live
//! in `ha-authorization`; production effect handlers live in `ha-effects`.

pub mod effects;
pub mod errors;
pub mod principal;
pub mod time;
pub mod types;

pub use effects::{
    Notification, NotificationKind, NotificationSink, PhysicalTimeEffects, RandomEffects,
};
pub use errors::{HaError, Result};
pub use principal::Principal;
pub use time::Timestamp;
pub use types::access::{Action, Module, Role};
pub use types::identifiers::{ActivityId, HouseId, NotificationId, SessionId, UserId};
