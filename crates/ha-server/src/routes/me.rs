//! `/api/me` and navigation checks for the frontend router

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use ha_core::Principal;
use ha_guards::{RouteDecision, UiGate, VisibleRoute};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(me))
        .route("/api/me/capabilities", get(capabilities))
        .route("/api/navigate", post(navigate))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub principal: Principal,
    pub capabilities: UiGate,
    pub routes: Vec<VisibleRoute>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub path: String,
}

async fn me(State(state): State<AppState>, AuthUser(principal): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        capabilities: UiGate::for_role(principal.role),
        routes: state.routes.visible_routes(principal.role),
        principal,
    })
}

async fn capabilities(AuthUser(principal): AuthUser) -> Json<UiGate> {
    Json(UiGate::for_role(principal.role))
}

/// Anonymous callers are allowed; they get `redirect_to_login` for guarded paths
async fn navigate(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(req): Json<NavigateRequest>,
) -> ApiResult<Json<RouteDecision>> {
    let principal = user.map(|AuthUser(p)| p);
    Ok(Json(state.routes.navigate(principal.as_ref(), &req.path)))
}
