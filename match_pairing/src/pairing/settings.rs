//! Pairing engine settings.

use serde::{Deserialize, Serialize};

/// Fewest eligible players a pairing can be generated for
pub const MIN_PLAYERS: usize = 2;

/// Largest leaderboard field that is still paired head-to-head
pub const DEFAULT_LEADERBOARD_PAIRWISE_LIMIT: usize = 8;

/// Pairing engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingSettings {
    /// Minimum eligible players for Generate (never below 2)
    pub min_players: usize,

    /// Leaderboard matches up to this size fall back to round robin
    pub leaderboard_pairwise_limit: usize,
}

impl PairingSettings {
    /// Load settings from environment variables
    ///
    /// - `PAIRING_MIN_PLAYERS` (default: 2, values below 2 are raised to 2)
    /// - `LEADERBOARD_PAIRWISE_LIMIT` (default: 8)
    pub fn from_env() -> Self {
        let min_players = std::env::var("PAIRING_MIN_PLAYERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(MIN_PLAYERS);

        let leaderboard_pairwise_limit = std::env::var("LEADERBOARD_PAIRWISE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LEADERBOARD_PAIRWISE_LIMIT);

        Self {
            min_players: min_players.max(MIN_PLAYERS),
            leaderboard_pairwise_limit,
        }
    }
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            leaderboard_pairwise_limit: DEFAULT_LEADERBOARD_PAIRWISE_LIMIT,
        }
    }
}
