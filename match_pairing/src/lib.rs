//! # Match Pairing
//!
//! Assigns tournament participants to head-to-head slots within a match and
//! manages that assignment from proposal to publication.
//!
//! ## Architecture
//!
//! A pairing is generated in three steps:
//!
//! - **Seeding**: participants are ordered randomly, by seed number, by skill
//!   rating, or left in join order
//! - **Pairing**: the match format selects a strategy (elimination, round
//!   robin, leaderboard, Swiss or simple consecutive pairs)
//! - **Merge**: hybrid requests overlay caller-supplied pairs onto the
//!   strategy output by match number
//!
//! The result is stored as a versioned record that moves through
//! `proposed -> approved -> published` or `proposed -> rejected`. Records are
//! never overwritten by an edit or a regenerate; each produces a new version
//! and moves the match's current-record pointer.
//!
//! ## Core Modules
//!
//! - [`pairing`]: domain types, strategies, the approval workflow and [`PairingManager`]
//! - [`db`]: storage traits and their PostgreSQL implementations
//! - [`memory`]: in-process storage for tests and local runs
//!
//! ## Example
//!
//! ```
//! use match_pairing::{EligiblePlayer, MatchFormat, PairingAlgorithm, PairingSettings, PairingStrategy, PaymentStatus};
//!
//! let players: Vec<EligiblePlayer> = ["a", "b", "c", "d"]
//!     .iter()
//!     .map(|id| EligiblePlayer {
//!         external_id: id.to_string(),
//!         name: id.to_uppercase(),
//!         joined_at: chrono::Utc::now(),
//!         payment_status: PaymentStatus::Paid,
//!     })
//!     .collect();
//!
//! let algorithm = PairingAlgorithm::for_format(MatchFormat::SingleElimination, &PairingSettings::default());
//! let output = algorithm.pair(&players);
//! assert_eq!(output.pairs.len(), 2);
//! assert_eq!(output.pairs[0].player2_id, "d");
//! ```

/// Storage traits and PostgreSQL adapters.
pub mod db;

/// In-memory storage adapters.
pub mod memory;

/// Pairing domain and orchestration.
pub mod pairing;
pub use pairing::{
    EligiblePlayer, MatchFormat, MatchId, Pair, PairingAlgorithm, PairingError, PairingManager,
    PairingRequest, PairingResponse, PairingResult, PairingSettings, PairingStatus,
    PairingStrategy, PairingType, PaymentStatus, SeedingMethod, SeedingResolver,
};
