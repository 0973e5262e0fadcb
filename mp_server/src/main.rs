//! Match pairing server.
//!
//! Serves the pairing workflow over HTTP, backed by PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use match_pairing::{
    PairingManager, SeedingResolver,
    db::{Database, PgMatchUpdater, PgPairingRepository, PgParticipantDirectory},
    pairing::ThreadShuffle,
};
use mp_server::{api, config::ServerConfig, logging, metrics};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the match pairing server

USAGE:
  mp_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --metrics    IP:PORT     Prometheus scrape address   [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  METRICS_BIND             Prometheus exporter address
  PAIRING_MIN_PLAYERS      Fewest eligible players a pairing needs (>= 2)
  LEADERBOARD_PAIRWISE_LIMIT
                           Largest leaderboard field paired head-to-head
  RUST_LOG                 Log filter (default: info,sqlx=warn)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    metrics: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        metrics: pargs.opt_value_from_str("--metrics")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.metrics)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    info!("Database connected and migrated");

    let pool = Arc::new(db.pool().clone());
    let pairing_manager = PairingManager::new(
        Arc::new(PgPairingRepository::new(pool.clone())),
        Arc::new(PgParticipantDirectory::new(pool.clone())),
        Arc::new(PgMatchUpdater::new(pool)),
        SeedingResolver::new(Arc::new(ThreadShuffle)),
        config.pairing,
    );

    let app = api::create_router(api::AppState {
        pairing_manager: Arc::new(pairing_manager),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
