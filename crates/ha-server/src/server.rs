//! Router assembly and server lifecycle

use crate::config::{BootstrapHouse, ServerConfig};
use crate::routes::api_router;
use crate::state::AppState;
use crate::websocket::websocket_handler;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use ha_core::{HaError, PhysicalTimeEffects, RandomEffects, Result};
use ha_store::{HouseRepository, Store};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// The complete application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api_router())
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Create configured houses whose code is not taken yet
///
/// Returns the number of houses created. The first admin's temporary PIN is
/// logged once, since nobody else can read it.
pub async fn bootstrap_houses(state: &AppState, houses: &[BootstrapHouse]) -> Result<usize> {
    let mut created = 0;
    for house in houses {
        let code = house.code.trim().to_ascii_lowercase();
        if state.auth.store().find_house_by_code(&code).await?.is_some() {
            info!(code = %code, "Bootstrap house already exists");
            continue;
        }
        let result = state
            .admin
            .houses
            .create_house(&house.name, &code, &house.pin, &house.admin_name)
            .await?;
        warn!(
            code = %result.house.code,
            admin = %result.admin.display_name,
            temporary_pin = %result.temporary_pin.pin,
            "Bootstrap house created; hand the temporary PIN to its admin"
        );
        created += 1;
    }
    Ok(created)
}

/// Periodically mark sessions past their refresh window as expired
pub fn spawn_session_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let now = state.auth.now().await;
            if let Err(e) = state.admin.sessions.expire_stale(now).await {
                error!(error = %e, "Session sweep failed");
            }
        }
    })
}

/// Build everything from `config` and serve until ctrl-c
pub async fn run(
    config: ServerConfig,
    store: Arc<dyn Store>,
    time: Arc<dyn PhysicalTimeEffects>,
    random: Arc<dyn RandomEffects>,
) -> Result<()> {
    config.validate()?;
    let state = AppState::new(store, time, random, config.auth.clone())?;
    bootstrap_houses(&state, &config.bootstrap.houses).await?;

    let sweeper = (config.server.session_sweep_secs > 0).then(|| {
        spawn_session_sweeper(
            state.clone(),
            Duration::from_secs(config.server.session_sweep_secs),
        )
    });

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "HomeAsisstan server listening");
    let served = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HaError::internal(format!("server error: {e}")));

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
