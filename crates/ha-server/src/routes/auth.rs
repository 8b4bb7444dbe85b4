//! `/api/auth/*`: house PIN, member login, activation, refresh, logout

use crate::error::ApiResult;
use crate::extract::{bearer_token, user_agent, AuthUser};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{post, put},
    Json, Router,
};
use ha_authentication::{HouseLogin, LoginOutcome, MemberSummary, SessionTokens};
use ha_core::{HaError, UserId};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/house", post(house_login))
        .route("/api/auth/members", post(members))
        .route("/api/auth/login", post(login))
        .route("/api/auth/activate", post(activate))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/pin", put(change_pin))
}

#[derive(Debug, Deserialize)]
pub struct HouseLoginRequest {
    pub code: String,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseTokenRequest {
    pub house_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub house_token: String,
    pub user_id: UserId,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub activation_token: String,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePinRequest {
    pub current_pin: String,
    pub new_pin: String,
}

async fn house_login(
    State(state): State<AppState>,
    Json(req): Json<HouseLoginRequest>,
) -> ApiResult<Json<HouseLogin>> {
    Ok(Json(state.auth.verify_house_pin(&req.code, &req.pin).await?))
}

async fn members(
    State(state): State<AppState>,
    Json(req): Json<HouseTokenRequest>,
) -> ApiResult<Json<Vec<MemberSummary>>> {
    Ok(Json(state.auth.members_for_house_token(&req.house_token).await?))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginOutcome>> {
    let outcome = state
        .auth
        .login(&req.house_token, req.user_id, &req.pin, user_agent(&headers))
        .await?;
    Ok(Json(outcome))
}

async fn activate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ActivateRequest>,
) -> ApiResult<Json<SessionTokens>> {
    let tokens = state
        .auth
        .activate(&req.activation_token, &req.pin, user_agent(&headers))
        .await?;
    Ok(Json(tokens))
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<SessionTokens>> {
    Ok(Json(state.auth.refresh(&req.refresh_token).await?))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let token =
        bearer_token(&headers).ok_or_else(|| HaError::unauthorized("missing bearer token"))?;
    state.auth.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_pin(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<ChangePinRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth
        .change_pin(&principal, &req.current_pin, &req.new_pin)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
