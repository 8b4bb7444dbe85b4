//! # HomeAsisstan Store - Layer 2: Persistence
//!
//! The database is an external collaborator. This crate pins down what the rest
//! of the workspace needs from it:
//!
//! - [`records`]: the persisted shapes of houses, members, sessions, activity
//! - [`traits`]: async repository traits, one per aggregate, plus the [`Store`]
//!   supertrait services are generic over
//! - [`memory`]: an in-memory backend used by the server and by tests
//!
//! Sessions are never deleted. Revocation flips `is_revoked` and stamps
//! `revoked_at`, so the admin panel can audit past logins.

#![allow(missing_docs)]

pub mod memory;
pub mod records;
pub mod traits;

pub use memory::MemoryStore;
pub use records::{
    ActivityQuery, ActivityRecord, Credential, HouseRecord, HouseRoster, PinHash, RevokeReason,
    SessionRecord, UserRecord,
};
pub use traits::{
    house_change, session_change, user_change, ActivityRepository, HouseChange, HouseRepository,
    SessionChange, SessionRepository, Store, UsedTokenRepository, UserChange, UserRepository,
};
