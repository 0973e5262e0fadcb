//! Pairing error types.

use thiserror::Error;

use super::models::{MatchId, PairingId};
use super::state::{PairingAction, PairingStatus};

/// Pairing errors
#[derive(Debug, Error)]
pub enum PairingError {
    /// Malformed request, missing manual pairs or too few eligible players
    #[error("Invalid pairing request: {0}")]
    Input(String),

    /// Unknown match
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// The match has no pairing record yet
    #[error("No pairing exists for match {0}")]
    NoPairing(MatchId),

    /// Unknown pairing record
    #[error("Pairing record not found: {0}")]
    RecordNotFound(PairingId),

    /// Illegal transition for the record's current status
    #[error("Cannot {action} a pairing in {status} state")]
    InvalidState {
        action: PairingAction,
        status: PairingStatus,
    },

    /// Stored state changed between read and write
    #[error("Pairing for match {match_id} was modified concurrently")]
    Conflict { match_id: MatchId },

    /// Database error
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A stored column held a value the engine does not recognise
    #[error("Invalid stored value: {0}")]
    InvalidStoredValue(String),
}

impl PairingError {
    /// Whether retrying the same call can succeed.
    ///
    /// Conflicts should be retried after re-reading the current state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PairingError::Conflict { .. } | PairingError::Storage(_))
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            PairingError::Storage(_) => "Storage temporarily unavailable".to_string(),
            PairingError::InvalidStoredValue(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for pairing operations
pub type PairingResult<T> = Result<T, PairingError>;
