//! Effect traits
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effects
//! - **Implementation**: `ha-effects` (production), `ha-testkit` (deterministic)
//! - **Usage**: any service needing the wall clock, randomness or push notifications
//!
//! Services are generic over these traits and never call `SystemTime::now()` or
//! `rand::thread_rng()` directly.

pub mod notification;
pub mod random;
pub mod time;

pub use notification::{Notification, NotificationKind, NotificationSink};
pub use random::RandomEffects;
pub use time::PhysicalTimeEffects;
