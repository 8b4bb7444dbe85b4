//! # HomeAsisstan Effects - Layer 2: Production Handlers
//!
//! Stateless implementations of the effect traits defined in `ha-core`.
//! Deterministic doubles for tests live in `ha-testkit`.

pub mod random;
pub mod time;

pub use random::RealRandomHandler;
pub use time::RealTimeHandler;
