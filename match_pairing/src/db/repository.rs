//! Repository trait definitions for testability and dependency injection.
//!
//! The pairing engine talks to storage and to its external collaborators only
//! through these traits. Postgres implementations live in [`super::postgres`];
//! in-process implementations live in [`crate::memory`].

use async_trait::async_trait;

use crate::pairing::{
    EligiblePlayer, MatchId, MatchInfo, Pair, PairingId, PairingRecord, PairingResult,
    PairingStatus, PlayerSeeding, TournamentId,
};

/// Durable storage for pairing records and the match pointer
#[async_trait]
pub trait PairingRepository: Send + Sync {
    /// Find a match by ID
    async fn find_match(&self, match_id: MatchId) -> PairingResult<Option<MatchInfo>>;

    /// Find a pairing record by ID
    async fn find_record(&self, pairing_id: PairingId) -> PairingResult<Option<PairingRecord>>;

    /// Record the match currently points to
    async fn current_record(&self, match_id: MatchId) -> PairingResult<Option<PairingRecord>>;

    /// All records for a match, newest proposal first
    async fn history(&self, match_id: MatchId) -> PairingResult<Vec<PairingRecord>>;

    /// Insert a new record and point its match at it, atomically.
    ///
    /// Fails with `Conflict` if the match no longer points at
    /// `expected_current` or the record's version is already taken.
    async fn insert_current(
        &self,
        record: &PairingRecord,
        expected_current: Option<PairingId>,
    ) -> PairingResult<()>;

    /// Insert a revision of `prior_id` and point the match at it, atomically.
    ///
    /// Like [`insert_current`](Self::insert_current) with `prior_id` as the
    /// expected pointer, but also fails with `Conflict` unless the prior
    /// record is still stored in `expected_status`.
    async fn supersede(
        &self,
        record: &PairingRecord,
        prior_id: PairingId,
        expected_status: PairingStatus,
    ) -> PairingResult<()>;

    /// Persist a transitioned record, atomically with its match pointer.
    ///
    /// Succeeds only if the stored status still equals `expected_status` and
    /// the match still points at the record; fails with `Conflict` otherwise.
    async fn apply_transition(
        &self,
        record: &PairingRecord,
        expected_status: PairingStatus,
    ) -> PairingResult<()>;

    /// Check storage connectivity
    async fn ping(&self) -> PairingResult<()>;
}

/// Source of tournament participants and their seeding data
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Participants of a tournament, ordered by join time
    async fn eligible_players(
        &self,
        tournament_id: TournamentId,
    ) -> PairingResult<Vec<EligiblePlayer>>;

    /// Seed numbers and skill ratings for a tournament
    async fn player_seedings(&self, tournament_id: TournamentId)
    -> PairingResult<Vec<PlayerSeeding>>;
}

/// Receives published pairs and assigns them to match player slots
#[async_trait]
pub trait MatchUpdater: Send + Sync {
    /// For each pair, assign its two participants into the match's player slots
    async fn assign_pairs(&self, match_id: MatchId, pairs: &[Pair]) -> PairingResult<()>;
}
