//! HTTP routes

pub mod admin;
pub mod auth;
pub mod me;

use crate::error::ApiError;
use crate::state::AppState;
use axum::Router;
use ha_core::HaError;
use std::str::FromStr;

/// All `/api` routes
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(me::router())
        .merge(admin::router())
}

/// Parse an identifier from a path segment
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(HaError::invalid(format!("malformed {what} id: {raw}"))))
}
