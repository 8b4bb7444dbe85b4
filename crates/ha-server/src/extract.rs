//! Request extractors

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use ha_core::{HaError, Principal};
use ha_guards::GuardChain;
use serde::Deserialize;

/// Token from an `Authorization: Bearer …` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// The authenticated caller
///
/// Rejects with 401 when the bearer token is missing, expired or belongs to a
/// revoked session.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Run a guard chain against the caller
    pub fn guard(&self, chain: &GuardChain) -> Result<(), ApiError> {
        Ok(chain.evaluate(Some(&self.0)).into_result()?)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| HaError::unauthorized("missing bearer token"))?;
        Ok(AuthUser(state.auth.authenticate(token).await?))
    }
}

/// The caller of a websocket handshake
///
/// Browsers cannot set headers on websocket requests, so the access token may
/// come as a `token` query parameter; a bearer header is accepted too. Runs
/// before the upgrade so a bad token is a plain 401.
#[derive(Debug, Clone)]
pub struct SocketUser(pub Principal);

#[derive(Debug, Default, Deserialize)]
struct SocketParams {
    token: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for SocketUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<SocketParams>::try_from_uri(&parts.uri)
            .map_err(|_| HaError::invalid("malformed socket query"))?;
        let token = params
            .token
            .as_deref()
            .or_else(|| bearer_token(&parts.headers))
            .ok_or_else(|| HaError::unauthorized("missing access token"))?;
        Ok(SocketUser(state.auth.authenticate(token).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
