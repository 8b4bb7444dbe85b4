//! Guard primitives

pub mod chain;
pub mod types;

pub use chain::{Guard, GuardChain, HouseGuard, PermissionGuard, RoleGuard};
pub use types::{GuardDecision, GuardViolation};
