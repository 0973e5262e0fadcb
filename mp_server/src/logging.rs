//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `init` installs a `tracing`
//! subscriber that also captures those records.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are read from `RUST_LOG` (default: `info,sqlx=warn`).
///
/// # Example
///
/// ```no_run
/// use mp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a pairing workflow event
///
/// # Arguments
///
/// * `event` - Workflow operation (generate, edit, approve, publish, reject)
/// * `match_id` - Match the pairing belongs to
/// * `actor_id` - User that triggered the operation
/// * `version` - Resulting record version, if the operation succeeded
/// * `request_id` - Correlation ID of the HTTP request
///
/// # Example
///
/// ```
/// use mp_server::logging::log_pairing_event;
///
/// log_pairing_event("approve", 42, 7, Some(3), "3f2a9c1e");
/// ```
pub fn log_pairing_event(
    event: &str,
    match_id: i64,
    actor_id: i64,
    version: Option<i32>,
    request_id: &str,
) {
    tracing::info!(
        request_id = request_id,
        event = event,
        match_id = match_id,
        actor_id = actor_id,
        version = version,
        "PAIRING: {}",
        event
    );
}

/// Log API request/response
///
/// Requests slower than one second are logged at warn level.
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "Slow API request"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}
