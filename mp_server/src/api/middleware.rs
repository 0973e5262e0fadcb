//! Actor identification middleware for workflow endpoints.
//!
//! Authentication happens upstream of this server. Callers forward the
//! authenticated user as an `x-actor-id` header; the middleware parses it and
//! injects the [`ActorId`] into request extensions for downstream handlers.
//!
//! # Extracting the Actor
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use match_pairing::pairing::ActorId;
//!
//! async fn handler(Extension(actor): Extension<ActorId>) -> String {
//!     format!("Acting as user {}", actor)
//! }
//! # let _ = handler;
//! ```

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use match_pairing::pairing::ActorId;

/// Header carrying the acting user's ID
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Middleware that requires a numeric `x-actor-id` header and injects it.
///
/// # Behavior
///
/// - **Valid header**: Injects `ActorId` into request extensions, then calls the next handler
/// - **Missing or non-numeric header**: Returns `400 Bad Request`
pub async fn actor_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let actor = request
        .headers()
        .get(ACTOR_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<ActorId>().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
