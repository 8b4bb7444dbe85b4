//! HomeAsisstan Testing Infrastructure
//!
//! Deterministic stand-ins for the effect traits plus a ready-made house with
//! one member per role, so tests can start from a realistic tenant.
//!
//! ```rust,no_run
//! use ha_testkit::TestHouse;
//!
//! # async fn demo() {
//! let house = TestHouse::builder().seed(7).build().await;
//! let session = house.login_as(ha_core::Role::Member).await;
//! house.time.advance_secs(60);
//! # let _ = session;
//! # }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

pub mod fixtures;
pub mod notifier;
pub mod random;
pub mod time;

pub use fixtures::{
    init_test_tracing, test_auth_config, TestHouse, TestHouseBuilder, TEST_HOUSE_PIN,
};
pub use notifier::RecordingNotifier;
pub use random::SeededRandom;
pub use time::ControllableTime;
