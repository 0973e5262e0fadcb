//! HTTP server for the match pairing engine.
//!
//! Exposes [`match_pairing::PairingManager`] over a JSON API, with structured
//! logging and Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
