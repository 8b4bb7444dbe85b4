//! # HomeAsisstan Authorization - Layer 2
//!
//! Answers "may this role do that":
//!
//! - [`matrix`]: the static `Role × Module → Set<Action>` table
//! - [`hierarchy`]: the total order over roles and the member-management rules
//!   derived from it
//! - [`scope`]: house/owner filters applied to backend queries
//!
//! Everything here is pure. Identity verification lives in
//! `ha-authentication`; route and UI gating built on these answers lives in
//! `ha-guards`.

pub mod hierarchy;
pub mod matrix;
pub mod scope;

pub use hierarchy::{can_assign, can_authenticate, can_manage, has_min_role, role_rank};
pub use matrix::{
    accessible_modules, has_permission, permission_map, permissions_for, require_permission,
    ActionSet,
};
pub use scope::{data_scope, DataScope, ScopeFilter, Scoped};
