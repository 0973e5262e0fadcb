//! Pairing workflow API handlers.
//!
//! Endpoints for generating a match's pairing and moving it through the
//! approval workflow. Workflow endpoints need an `x-actor-id` header; the
//! status and history queries do not.
//!
//! # Examples
//!
//! Generate a rank-seeded pairing:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/matches/42/pairing \
//!   -H "x-actor-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"pairing_type": "AUTO", "seeding_method": "RANK_BASED"}'
//! ```
//!
//! Approve and publish in one step:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/matches/42/pairing/approve \
//!   -H "x-actor-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"finalize": true}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use match_pairing::pairing::{
    ActorId, MatchId, Pair, PairingError, PairingRequest, PairingResponse, PairingStatusView,
    PairingType, SeedingMethod,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct GeneratePairingRequest {
    pub pairing_type: PairingType,
    pub seeding_method: SeedingMethod,
    #[serde(default)]
    pub custom_pairs: Option<Vec<Pair>>,
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditPairsRequest {
    pub pairs: Vec<Pair>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub finalize: bool,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

/// `PairingError` rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub PairingError);

impl From<PairingError> for ApiError {
    fn from(err: PairingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            PairingError::Input(_) => StatusCode::BAD_REQUEST,
            PairingError::MatchNotFound(_)
            | PairingError::NoPairing(_)
            | PairingError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            PairingError::InvalidState { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PairingError::Conflict { .. } => StatusCode::CONFLICT,
            PairingError::Storage(_)
            | PairingError::InvalidStoredValue(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short label used for the transition outcome metric
    pub fn kind(&self) -> &'static str {
        match &self.0 {
            PairingError::Input(_) => "input",
            PairingError::MatchNotFound(_)
            | PairingError::NoPairing(_)
            | PairingError::RecordNotFound(_) => "not_found",
            PairingError::InvalidState { .. } => "invalid_state",
            PairingError::Conflict { .. } => "conflict",
            PairingError::Storage(_)
            | PairingError::InvalidStoredValue(_) => "storage",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Pairing request failed");
        }
        let body = ErrorResponse {
            error: self.0.client_message(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}

/// Record metrics and the audit log line for a workflow call
fn record(
    transition: &str,
    match_id: MatchId,
    actor: ActorId,
    request_id: &RequestId,
    result: Result<PairingResponse, PairingError>,
) -> Result<Json<PairingResponse>, ApiError> {
    match result {
        Ok(response) => {
            metrics::pairing_transitions_total(transition, "ok");
            logging::log_pairing_event(
                transition,
                match_id,
                actor,
                Some(response.version),
                &request_id.0,
            );
            Ok(Json(response))
        }
        Err(err) => {
            let err = ApiError(err);
            metrics::pairing_transitions_total(transition, err.kind());
            logging::log_pairing_event(transition, match_id, actor, None, &request_id.0);
            Err(err)
        }
    }
}

/// Generate a new proposed pairing for a match.
///
/// # Request Body
///
/// ```json
/// {
///   "pairing_type": "HYBRID",
///   "seeding_method": "SKILL_BASED",
///   "custom_pairs": [{"player1_id": "a", "player1_name": "A", "player2_id": "e", "player2_name": "E", "match_number": 1}],
///   "force_regenerate": false
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed pairs, missing manual pairs, or too few players
/// - `404 Not Found`: Match doesn't exist
/// - `422 Unprocessable Entity`: A pairing exists and `force_regenerate` is false
/// - `409 Conflict`: Another request changed the match's pairing concurrently
pub async fn generate_pairing(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorId>,
    Extension(request_id): Extension<RequestId>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<GeneratePairingRequest>,
) -> Result<(StatusCode, Json<PairingResponse>), ApiError> {
    let request = PairingRequest {
        match_id,
        pairing_type: body.pairing_type,
        seeding_method: body.seeding_method,
        custom_pairs: body.custom_pairs,
        force_regenerate: body.force_regenerate,
    };
    let pairing_type = request.pairing_type;

    let result = state.pairing_manager.generate(request, actor).await;
    if let Ok(response) = &result {
        let format = response
            .metadata
            .match_format
            .map(|f| f.to_string())
            .unwrap_or_default();
        metrics::pairings_generated_total(&format, &pairing_type.to_string());
        metrics::pairing_pairs(response.total_pairs);
    }

    let response = record("generate", match_id, actor, &request_id, result)?;
    Ok((StatusCode::CREATED, response))
}

/// Replace the pairs of the current proposed pairing.
///
/// Creates a new version; the previous one stays in the history.
pub async fn edit_pairs(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorId>,
    Extension(request_id): Extension<RequestId>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<EditPairsRequest>,
) -> Result<Json<PairingResponse>, ApiError> {
    let result = state
        .pairing_manager
        .edit_pairs(match_id, body.pairs, actor)
        .await;
    record("edit", match_id, actor, &request_id, result)
}

/// Approve the current pairing. With `finalize`, publish it as well.
pub async fn approve_pairing(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorId>,
    Extension(request_id): Extension<RequestId>,
    Path(match_id): Path<MatchId>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<PairingResponse>, ApiError> {
    let finalize = body.is_some_and(|Json(body)| body.finalize);
    let result = state
        .pairing_manager
        .approve(match_id, actor, finalize)
        .await;
    record("approve", match_id, actor, &request_id, result)
}

/// Publish the current approved pairing and assign its pairs to the match.
pub async fn publish_pairing(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorId>,
    Extension(request_id): Extension<RequestId>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<PairingResponse>, ApiError> {
    let result = state.pairing_manager.publish(match_id, actor).await;
    record("publish", match_id, actor, &request_id, result)
}

/// Reject the current proposed pairing. A non-blank reason is required.
pub async fn reject_pairing(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorId>,
    Extension(request_id): Extension<RequestId>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<PairingResponse>, ApiError> {
    let result = state
        .pairing_manager
        .reject(match_id, actor, &body.reason)
        .await;
    record("reject", match_id, actor, &request_id, result)
}

/// Re-send the published pairs to the match updater.
pub async fn redeliver_pairing(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorId>,
    Extension(request_id): Extension<RequestId>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<PairingResponse>, ApiError> {
    let result = state.pairing_manager.redeliver(match_id).await;
    record("redeliver", match_id, actor, &request_id, result)
}

/// Workflow status of the match's current pairing.
///
/// Returns `has_pairing: false` when nothing was generated yet.
pub async fn get_pairing_status(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<PairingStatusView>, ApiError> {
    Ok(Json(state.pairing_manager.status(match_id).await?))
}

/// All pairings of a match, newest first.
pub async fn get_pairing_history(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<PairingStatusView>>, ApiError> {
    Ok(Json(state.pairing_manager.history(match_id).await?))
}
