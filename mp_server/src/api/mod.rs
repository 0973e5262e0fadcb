//! HTTP API for the pairing server.
//!
//! # Modules
//!
//! - [`pairings`]: Pairing generation and approval workflow handlers
//! - [`middleware`]: Actor identification for workflow endpoints
//! - [`request_id`]: Request correlation IDs and HTTP metrics
//!
//! # Endpoints Overview
//!
//! ## Workflow (requires `x-actor-id`)
//! - `POST /api/v1/matches/{match_id}/pairing` - Generate pairing
//! - `PUT  /api/v1/matches/{match_id}/pairing` - Edit proposed pairs
//! - `POST /api/v1/matches/{match_id}/pairing/approve` - Approve (optionally finalize)
//! - `POST /api/v1/matches/{match_id}/pairing/publish` - Publish
//! - `POST /api/v1/matches/{match_id}/pairing/reject` - Reject with reason
//! - `POST /api/v1/matches/{match_id}/pairing/redeliver` - Re-send published pairs
//!
//! ## Queries
//! - `GET /api/v1/matches/{match_id}/pairing` - Current pairing status
//! - `GET /api/v1/matches/{match_id}/pairing/history` - All versions, newest first
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod middleware;
pub mod pairings;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use match_pairing::pairing::PairingManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pairing_manager: Arc<PairingManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use mp_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    let query_routes = Router::new()
        .route(
            "/matches/{match_id}/pairing",
            get(pairings::get_pairing_status),
        )
        .route(
            "/matches/{match_id}/pairing/history",
            get(pairings::get_pairing_history),
        );

    let workflow_routes = Router::new()
        .route(
            "/matches/{match_id}/pairing",
            post(pairings::generate_pairing).put(pairings::edit_pairs),
        )
        .route(
            "/matches/{match_id}/pairing/approve",
            post(pairings::approve_pairing),
        )
        .route(
            "/matches/{match_id}/pairing/publish",
            post(pairings::publish_pairing),
        )
        .route(
            "/matches/{match_id}/pairing/reject",
            post(pairings::reject_pairing),
        )
        .route(
            "/matches/{match_id}/pairing/redeliver",
            post(pairings::redeliver_pairing),
        )
        .route_layer(axum::middleware::from_fn(middleware::actor_middleware));

    Router::new().merge(query_routes).merge(workflow_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage answers, `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = state.pairing_manager.health_check().await.is_ok();

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
