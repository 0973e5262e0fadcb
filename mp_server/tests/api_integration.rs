//! Integration tests for the pairing HTTP API.
//!
//! The router is driven with `oneshot` against in-memory storage, so no
//! database is needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use match_pairing::memory::{InMemoryPairingStore, RecordingMatchUpdater, StaticDirectory};
use match_pairing::pairing::{
    EligiblePlayer, MatchFormat, MatchInfo, PairingManager, PairingSettings, PaymentStatus,
    SeededShuffle, SeedingResolver,
};
use mp_server::api::{AppState, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

struct TestServer {
    app: axum::Router,
    updater: Arc<RecordingMatchUpdater>,
}

/// Helper to create a router over one single-elimination match with four players
async fn create_test_server() -> TestServer {
    let store = Arc::new(InMemoryPairingStore::new());
    store
        .add_match(MatchInfo {
            id: 1,
            tournament_id: 10,
            batch_id: None,
            format: MatchFormat::SingleElimination,
            current_pairing_id: None,
        })
        .await;

    let start = Utc::now();
    let directory = Arc::new(StaticDirectory::new());
    directory
        .set_players(
            10,
            ["a", "b", "c", "d"]
                .iter()
                .enumerate()
                .map(|(i, id)| EligiblePlayer {
                    external_id: id.to_string(),
                    name: id.to_uppercase(),
                    joined_at: start + Duration::seconds(i as i64),
                    payment_status: PaymentStatus::Paid,
                })
                .collect(),
        )
        .await;

    let updater = Arc::new(RecordingMatchUpdater::new());
    let manager = PairingManager::new(
        store,
        directory,
        updater.clone(),
        SeedingResolver::new(Arc::new(SeededShuffle::new(3))),
        PairingSettings::default(),
    );

    TestServer {
        app: create_router(AppState {
            pairing_manager: Arc::new(manager),
        }),
        updater,
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    actor: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn auto_request() -> Value {
    json!({"pairing_type": "AUTO", "seeding_method": "CUSTOM"})
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;
    let (status, body) = send(&server.app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_generate_returns_proposed_pairing() {
    let server = create_test_server().await;
    let (status, body) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        Some("7"),
        Some(auto_request()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "proposed");
    assert_eq!(body["version"], 1);
    assert_eq!(body["total_pairs"], 2);
    assert_eq!(body["can_approve"], true);
    assert_eq!(body["pairs"][0]["player1_id"], "a");
    assert_eq!(body["pairs"][0]["player2_id"], "d");
    assert_eq!(body["metadata"]["bracket_type"], "single_elimination");
}

#[tokio::test]
async fn test_workflow_requires_actor_header() {
    let server = create_test_server().await;
    let (status, _) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        None,
        Some(auto_request()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        Some("not-a-number"),
        Some(auto_request()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_without_pairing() {
    let server = create_test_server().await;
    let (status, body) = send(&server.app, "GET", "/api/v1/matches/1/pairing", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_pairing"], false);
}

#[tokio::test]
async fn test_unknown_match_is_not_found() {
    let server = create_test_server().await;
    let (status, body) = send(
        &server.app,
        "GET",
        "/api/v1/matches/999/pairing/history",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_approve_finalize_publishes_and_hands_off() {
    let server = create_test_server().await;
    send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        Some("7"),
        Some(auto_request()),
    )
    .await;

    let (status, body) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing/approve",
        Some("8"),
        Some(json!({"finalize": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "published");
    assert_eq!(server.updater.assignments().await.len(), 1);

    let (_, status_body) =
        send(&server.app, "GET", "/api/v1/matches/1/pairing", None, None).await;
    assert_eq!(status_body["approved_by"], 8);
    assert_eq!(status_body["published_by"], 8);
}

#[tokio::test]
async fn test_reject_then_approve_is_unprocessable() {
    let server = create_test_server().await;
    send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        Some("7"),
        Some(auto_request()),
    )
    .await;

    let (status, body) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing/reject",
        Some("8"),
        Some(json!({"reason": "duplicate entry"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (status, body) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing/approve",
        Some("8"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Cannot approve a pairing in rejected state");

    let mut regenerate = auto_request();
    regenerate["force_regenerate"] = json!(true);
    let (status, body) = send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        Some("7"),
        Some(regenerate),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["version"], 2);

    let (_, history) = send(
        &server.app,
        "GET",
        "/api/v1/matches/1/pairing/history",
        None,
        None,
    )
    .await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["version"], 2);
    assert_eq!(history[1]["rejection_reason"], "duplicate entry");
}

#[tokio::test]
async fn test_edit_with_invalid_pairs_is_bad_request() {
    let server = create_test_server().await;
    send(
        &server.app,
        "POST",
        "/api/v1/matches/1/pairing",
        Some("7"),
        Some(auto_request()),
    )
    .await;

    let (status, _) = send(
        &server.app,
        "PUT",
        "/api/v1/matches/1/pairing",
        Some("7"),
        Some(json!({"pairs": [{
            "player1_id": "a", "player1_name": "A",
            "player2_id": "a", "player2_name": "A",
            "match_number": 1
        }]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_twice_without_force_is_unprocessable() {
    let server = create_test_server().await;
    for expected in [StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY] {
        let (status, _) = send(
            &server.app,
            "POST",
            "/api/v1/matches/1/pairing",
            Some("7"),
            Some(auto_request()),
        )
        .await;
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn test_workflow_request_carries_request_id() {
    let server = create_test_server().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/matches/1/pairing")
        .header("x-actor-id", "7")
        .header("x-request-id", "audit-42")
        .header("content-type", "application/json")
        .body(Body::from(auto_request().to_string()))
        .unwrap();

    let response = server.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-request-id"], "audit-42");
}
