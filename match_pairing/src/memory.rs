//! In-process implementations of the repository traits.
//!
//! Used by tests and local runs without PostgreSQL. Each write holds the
//! store's lock for its whole check-then-write, which gives the same
//! all-or-nothing and compare-and-swap behaviour as the Postgres adapters.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::{MatchUpdater, PairingRepository, ParticipantDirectory};
use crate::pairing::{
    EligiblePlayer, MatchId, MatchInfo, Pair, PairingError, PairingId, PairingRecord,
    PairingResult, PairingStatus, PlayerSeeding, TournamentId,
};

#[derive(Debug, Default)]
struct StoreState {
    matches: HashMap<MatchId, MatchInfo>,
    records: HashMap<PairingId, PairingRecord>,
}

impl StoreState {
    fn insert_current(
        &mut self,
        record: &PairingRecord,
        expected_current: Option<PairingId>,
    ) -> PairingResult<()> {
        let conflict = PairingError::Conflict {
            match_id: record.match_id,
        };

        let version_taken = self
            .records
            .values()
            .any(|r| r.match_id == record.match_id && r.version == record.version);
        if version_taken || self.records.contains_key(&record.id) {
            return Err(conflict);
        }

        let info = self
            .matches
            .get_mut(&record.match_id)
            .ok_or(PairingError::MatchNotFound(record.match_id))?;
        if info.current_pairing_id != expected_current {
            return Err(conflict);
        }
        info.current_pairing_id = Some(record.id);

        self.records.insert(record.id, record.clone());
        Ok(())
    }
}

/// In-memory `PairingRepository`
#[derive(Debug, Default)]
pub struct InMemoryPairingStore {
    state: RwLock<StoreState>,
}

impl InMemoryPairingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a match. Any existing match with the same ID is replaced.
    pub async fn add_match(&self, info: MatchInfo) {
        self.state.write().await.matches.insert(info.id, info);
    }

    /// Number of stored records across all matches
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}

#[async_trait]
impl PairingRepository for InMemoryPairingStore {
    async fn find_match(&self, match_id: MatchId) -> PairingResult<Option<MatchInfo>> {
        Ok(self.state.read().await.matches.get(&match_id).cloned())
    }

    async fn find_record(&self, pairing_id: PairingId) -> PairingResult<Option<PairingRecord>> {
        Ok(self.state.read().await.records.get(&pairing_id).cloned())
    }

    async fn current_record(&self, match_id: MatchId) -> PairingResult<Option<PairingRecord>> {
        let state = self.state.read().await;
        Ok(state
            .matches
            .get(&match_id)
            .and_then(|m| m.current_pairing_id)
            .and_then(|id| state.records.get(&id))
            .cloned())
    }

    async fn history(&self, match_id: MatchId) -> PairingResult<Vec<PairingRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<PairingRecord> = state
            .records
            .values()
            .filter(|r| r.match_id == match_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.proposed_at
                .cmp(&a.proposed_at)
                .then_with(|| b.version.cmp(&a.version))
        });
        Ok(records)
    }

    async fn insert_current(
        &self,
        record: &PairingRecord,
        expected_current: Option<PairingId>,
    ) -> PairingResult<()> {
        self.state
            .write()
            .await
            .insert_current(record, expected_current)
    }

    async fn supersede(
        &self,
        record: &PairingRecord,
        prior_id: PairingId,
        expected_status: PairingStatus,
    ) -> PairingResult<()> {
        let mut state = self.state.write().await;
        let prior_status = state.records.get(&prior_id).map(|r| r.status);
        if prior_status != Some(expected_status) {
            return Err(PairingError::Conflict {
                match_id: record.match_id,
            });
        }
        state.insert_current(record, Some(prior_id))
    }

    async fn apply_transition(
        &self,
        record: &PairingRecord,
        expected_status: PairingStatus,
    ) -> PairingResult<()> {
        let mut state = self.state.write().await;
        let conflict = PairingError::Conflict {
            match_id: record.match_id,
        };

        let is_current = state
            .matches
            .get(&record.match_id)
            .is_some_and(|m| m.current_pairing_id == Some(record.id));
        if !is_current {
            return Err(conflict);
        }

        let stored = state
            .records
            .get_mut(&record.id)
            .ok_or(PairingError::RecordNotFound(record.id))?;
        if stored.status != expected_status {
            return Err(conflict);
        }
        *stored = record.clone();
        Ok(())
    }

    async fn ping(&self) -> PairingResult<()> {
        Ok(())
    }
}

/// `ParticipantDirectory` backed by fixed per-tournament lists
#[derive(Debug, Default)]
pub struct StaticDirectory {
    players: RwLock<HashMap<TournamentId, Vec<EligiblePlayer>>>,
    seedings: RwLock<HashMap<TournamentId, Vec<PlayerSeeding>>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the participants of a tournament
    pub async fn set_players(&self, tournament_id: TournamentId, players: Vec<EligiblePlayer>) {
        self.players.write().await.insert(tournament_id, players);
    }

    /// Replace the seeding data of a tournament
    pub async fn set_seedings(&self, tournament_id: TournamentId, seedings: Vec<PlayerSeeding>) {
        self.seedings.write().await.insert(tournament_id, seedings);
    }
}

#[async_trait]
impl ParticipantDirectory for StaticDirectory {
    async fn eligible_players(
        &self,
        tournament_id: TournamentId,
    ) -> PairingResult<Vec<EligiblePlayer>> {
        Ok(self
            .players
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn player_seedings(
        &self,
        tournament_id: TournamentId,
    ) -> PairingResult<Vec<PlayerSeeding>> {
        Ok(self
            .seedings
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// `MatchUpdater` that records every hand-off
#[derive(Debug, Default)]
pub struct RecordingMatchUpdater {
    assignments: RwLock<Vec<(MatchId, Vec<Pair>)>>,
}

impl RecordingMatchUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(match, pairs)` hand-off received so far, oldest first
    pub async fn assignments(&self) -> Vec<(MatchId, Vec<Pair>)> {
        self.assignments.read().await.clone()
    }
}

#[async_trait]
impl MatchUpdater for RecordingMatchUpdater {
    async fn assign_pairs(&self, match_id: MatchId, pairs: &[Pair]) -> PairingResult<()> {
        self.assignments
            .write()
            .await
            .push((match_id, pairs.to_vec()));
        Ok(())
    }
}
