//! # HomeAsisstan Server - Layer 5: HTTP API
//!
//! axum router over the authentication and admin services, the notification
//! socket, configuration loading and logging setup. `main.rs` wires it to the
//! production effect handlers and the in-memory store.

#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod routes;
pub mod server;
pub mod state;
pub mod websocket;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::{bootstrap_houses, build_router, run};
pub use state::AppState;
