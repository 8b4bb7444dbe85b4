//! # HomeAsisstan Guards - Layer 3: Guard Enforcement
//!
//! Turns the answers of `ha-authorization` into allow/deny decisions:
//!
//! - [`guards`]: guard decision vocabulary and composable role, permission and
//!   house guards evaluated as a chain
//! - [`routes`]: the navigation table the frontend router consults
//! - [`ui`]: per-widget render gates
//!
//! The server runs the same guards before handlers execute, so hiding a button
//! is never the only line of defence.

pub mod guards;
pub mod routes;
pub mod ui;

pub use guards::*;
pub use routes::{RouteDecision, RouteRequirement, RouteTable, VisibleRoute};
pub use ui::UiGate;
