//! Member, session, activity and house administration

use super::parse_id;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use ha_admin::{
    ActivitySummary, CreatedMember, HouseOverview, MemberView, SessionQuery, SessionView,
};
use ha_authentication::{HouseSummary, TemporaryPin};
use ha_core::{Action, Module, Role, SessionId, Timestamp, UserId};
use ha_guards::GuardChain;
use ha_store::{ActivityQuery, ActivityRecord};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/overview", get(overview))
        .route("/api/members", get(list_members).post(create_member))
        .route("/api/members/:id", delete(deactivate_member))
        .route("/api/members/:id/role", put(update_role))
        .route("/api/members/:id/reset-pin", post(reset_pin))
        .route("/api/members/:id/sessions", delete(revoke_member_sessions))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", delete(revoke_session))
        .route("/api/activity", get(list_activity).post(record_activity))
        .route("/api/activity/summary", get(activity_summary))
        .route("/api/house", get(get_house))
        .route("/api/house/pin", put(change_house_pin))
}

async fn overview(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<HouseOverview>> {
    user.guard(&GuardChain::new().permission(Module::Admin, Action::View))?;
    Ok(Json(state.admin.overview(&user.0).await?))
}

// --- members -------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

async fn list_members(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<MemberView>>> {
    Ok(Json(state.admin.members.list_members(&actor).await?))
}

async fn create_member(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateMemberRequest>,
) -> ApiResult<(StatusCode, Json<CreatedMember>)> {
    user.guard(&GuardChain::new().min_role(Role::Responsible))?;
    let created = state
        .admin
        .members
        .create_member(&user.0, &req.display_name, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<MemberView>> {
    let user_id: UserId = parse_id(&id, "member")?;
    Ok(Json(
        state
            .admin
            .members
            .update_role(&actor, user_id, req.role)
            .await?,
    ))
}

async fn deactivate_member(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MemberView>> {
    let user_id: UserId = parse_id(&id, "member")?;
    Ok(Json(
        state.admin.members.deactivate_member(&actor, user_id).await?,
    ))
}

async fn reset_pin(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TemporaryPin>> {
    let user_id: UserId = parse_id(&id, "member")?;
    Ok(Json(state.admin.members.reset_pin(&actor, user_id).await?))
}

// --- sessions ------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionParams {
    pub user: Option<String>,
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct RevokedCount {
    pub revoked: usize,
}

async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<SessionParams>,
) -> ApiResult<Json<Vec<SessionView>>> {
    let query = SessionQuery {
        user: params
            .user
            .as_deref()
            .map(|u| parse_id(u, "member"))
            .transpose()?,
        include_inactive: params.include_inactive,
    };
    Ok(Json(state.admin.sessions.list_sessions(&actor, &query).await?))
}

async fn revoke_session(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RevokedCount>> {
    let session_id: SessionId = parse_id(&id, "session")?;
    let revoked = state.admin.sessions.revoke_session(&actor, session_id).await?;
    Ok(Json(RevokedCount {
        revoked: usize::from(revoked),
    }))
}

async fn revoke_member_sessions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RevokedCount>> {
    let user_id: UserId = parse_id(&id, "member")?;
    let revoked = state
        .admin
        .sessions
        .revoke_user_sessions(&actor, user_id)
        .await?;
    Ok(Json(RevokedCount { revoked }))
}

// --- activity ------------------------------------------------------------

/// Query string of `GET /api/activity`; times are epoch milliseconds
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityParams {
    pub module: Option<String>,
    pub user: Option<String>,
    pub since: Option<u64>,
    pub until: Option<u64>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ActivityParams {
    fn into_query(self) -> ApiResult<ActivityQuery> {
        Ok(ActivityQuery {
            module: self.module.as_deref().map(str::parse::<Module>).transpose()?,
            user: self
                .user
                .as_deref()
                .map(|u| parse_id(u, "member"))
                .transpose()?,
            since: self.since.map(Timestamp::from_millis),
            until: self.until.map(Timestamp::from_millis),
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SummaryParams {
    pub since: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RecordActivityRequest {
    pub module: Module,
    pub action: Action,
    pub summary: String,
}

async fn list_activity(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<ActivityParams>,
) -> ApiResult<Json<Vec<ActivityRecord>>> {
    let query = params.into_query()?;
    Ok(Json(state.admin.activity.list(&actor, &query).await?))
}

async fn record_activity(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<RecordActivityRequest>,
) -> ApiResult<(StatusCode, Json<ActivityRecord>)> {
    let entry = state
        .admin
        .activity
        .record(&actor, req.module, req.action, &req.summary)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn activity_summary(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<SummaryParams>,
) -> ApiResult<Json<ActivitySummary>> {
    let since = params.since.map(Timestamp::from_millis);
    Ok(Json(state.admin.activity.summary(&actor, since).await?))
}

// --- house ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HousePinRequest {
    pub pin: String,
}

async fn get_house(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<HouseSummary>> {
    Ok(Json(state.admin.houses.get_house(&actor).await?))
}

async fn change_house_pin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<HousePinRequest>,
) -> ApiResult<StatusCode> {
    user.guard(&GuardChain::new().permission(Module::Settings, Action::Manage))?;
    state.admin.houses.change_house_pin(&user.0, &req.pin).await?;
    Ok(StatusCode::NO_CONTENT)
}
