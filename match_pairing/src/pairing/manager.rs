//! Pairing manager: generates pairings and drives them through approval.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::algorithms::{AlgorithmOutput, PairingAlgorithm, PairingStrategy};
use super::errors::{PairingError, PairingResult};
use super::merge::{manual_output, merge_overrides};
use super::models::{
    ActorId, EligiblePlayer, MatchId, MatchInfo, Pair, PairingMetadata, PairingRecord,
    PairingRequest, PairingResponse, PairingStatusView, PairingType, validate_pairs,
};
use super::seeding::SeedingResolver;
use super::settings::PairingSettings;
use super::state::{PairingAction, PairingStatus};
use crate::db::{MatchUpdater, PairingRepository, ParticipantDirectory};

/// Pairing manager
#[derive(Clone)]
pub struct PairingManager {
    repository: Arc<dyn PairingRepository>,
    directory: Arc<dyn ParticipantDirectory>,
    match_updater: Arc<dyn MatchUpdater>,
    seeding: SeedingResolver,
    settings: PairingSettings,
}

impl PairingManager {
    /// Create a new pairing manager
    pub fn new(
        repository: Arc<dyn PairingRepository>,
        directory: Arc<dyn ParticipantDirectory>,
        match_updater: Arc<dyn MatchUpdater>,
        seeding: SeedingResolver,
        settings: PairingSettings,
    ) -> Self {
        Self {
            repository,
            directory,
            match_updater,
            seeding,
            settings,
        }
    }

    pub fn settings(&self) -> &PairingSettings {
        &self.settings
    }

    /// Generate a new proposed pairing for a match.
    ///
    /// Fails with `InvalidState` if the match already has a current record
    /// and `force_regenerate` is not set. The previous record is kept as history.
    pub async fn generate(
        &self,
        request: PairingRequest,
        actor: ActorId,
    ) -> PairingResult<PairingResponse> {
        request.validate()?;

        let info = self.load_match(request.match_id).await?;
        let current = self.repository.current_record(info.id).await?;

        if let Some(current) = current.as_ref().filter(|_| !request.force_regenerate) {
            return Err(PairingError::InvalidState {
                action: PairingAction::Generate,
                status: current.status,
            });
        }

        let players = self.eligible_players(&info).await?;
        let player_count = players.len();

        let output = match request.pairing_type {
            PairingType::Manual => manual_output(request.custom_pairs.as_deref().unwrap_or(&[])),
            PairingType::Auto => self.run_algorithm(&info, players, &request).await?,
            PairingType::Hybrid => {
                let auto = self.run_algorithm(&info, players, &request).await?;
                merge_overrides(auto, request.custom_pairs.as_deref().unwrap_or(&[]))
            }
        };

        let AlgorithmOutput { pairs, metadata } = output;
        let metadata = PairingMetadata {
            player_count: metadata.player_count.or(Some(player_count)),
            pair_count: Some(pairs.len()),
            seeding_method: Some(request.seeding_method),
            match_format: Some(info.format),
            ..metadata
        };

        let record = PairingRecord {
            id: Uuid::new_v4(),
            match_id: info.id,
            tournament_id: info.tournament_id,
            batch_id: info.batch_id,
            pairing_type: request.pairing_type,
            seeding_method: request.seeding_method,
            algorithm_used: info.format,
            pairs,
            metadata,
            status: PairingStatus::Proposed,
            version: current.as_ref().map_or(0, |r| r.version) + 1,
            proposed_by: actor,
            proposed_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            published_by: None,
            published_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
        };

        self.repository
            .insert_current(&record, info.current_pairing_id)
            .await
            .inspect_err(|e| log_conflict(info.id, "generate", e))?;

        info!(
            "Generated {} pairing v{} for match {} ({} pairs, {} players, format {})",
            record.pairing_type,
            record.version,
            record.match_id,
            record.pairs.len(),
            player_count,
            record.algorithm_used
        );

        Ok(PairingResponse::from(&record))
    }

    /// Replace the pairs of the current proposed record with a new version.
    ///
    /// Fails with `Conflict` if the record left proposed status after it was read.
    pub async fn edit_pairs(
        &self,
        match_id: MatchId,
        pairs: Vec<Pair>,
        actor: ActorId,
    ) -> PairingResult<PairingResponse> {
        if pairs.is_empty() {
            return Err(PairingError::Input(
                "an edit must supply at least one pair".to_string(),
            ));
        }
        validate_pairs(&pairs)?;

        let current = self.current_record(match_id).await?;
        let revised = current.revised(pairs, actor, Utc::now())?;

        self.repository
            .supersede(&revised, current.id, current.status)
            .await
            .inspect_err(|e| log_conflict(match_id, "edit", e))?;

        info!(
            "Edited pairing for match {}: v{} replaced by v{} ({} pairs)",
            match_id,
            current.version,
            revised.version,
            revised.pairs.len()
        );

        Ok(PairingResponse::from(&revised))
    }

    /// Approve the current record, publishing it straight away when `finalize` is set
    pub async fn approve(
        &self,
        match_id: MatchId,
        actor: ActorId,
        finalize: bool,
    ) -> PairingResult<PairingResponse> {
        let current = self.current_record(match_id).await?;
        let approved = current.approved(actor, Utc::now())?;
        self.transition(&approved, current.status).await?;

        if finalize {
            return self.publish_record(approved, actor).await;
        }
        Ok(PairingResponse::from(&approved))
    }

    /// Publish the current approved record and hand its pairs to the match updater
    pub async fn publish(&self, match_id: MatchId, actor: ActorId) -> PairingResult<PairingResponse> {
        let current = self.current_record(match_id).await?;
        self.publish_record(current, actor).await
    }

    /// Reject the current proposed record
    pub async fn reject(
        &self,
        match_id: MatchId,
        actor: ActorId,
        reason: &str,
    ) -> PairingResult<PairingResponse> {
        let current = self.current_record(match_id).await?;
        let rejected = current.rejected(actor, Utc::now(), reason)?;
        self.transition(&rejected, current.status).await?;
        Ok(PairingResponse::from(&rejected))
    }

    /// Workflow status of the match's current record
    pub async fn status(&self, match_id: MatchId) -> PairingResult<PairingStatusView> {
        let info = self.load_match(match_id).await?;
        let current = self.repository.current_record(info.id).await?;
        Ok(current
            .as_ref()
            .map_or_else(|| PairingStatusView::none(match_id), PairingStatusView::from))
    }

    /// Every record for the match, newest proposal first
    pub async fn history(&self, match_id: MatchId) -> PairingResult<Vec<PairingStatusView>> {
        self.load_match(match_id).await?;
        let records = self.repository.history(match_id).await?;
        Ok(records.iter().map(PairingStatusView::from).collect())
    }

    /// Hand the published pairs to the match updater again.
    ///
    /// Used when the hand-off after a publish failed. Only a published
    /// current record can be redelivered.
    pub async fn redeliver(&self, match_id: MatchId) -> PairingResult<PairingResponse> {
        let current = self.current_record(match_id).await?;
        if current.status != PairingStatus::Published {
            return Err(PairingError::InvalidState {
                action: PairingAction::Publish,
                status: current.status,
            });
        }
        self.match_updater
            .assign_pairs(match_id, &current.pairs)
            .await?;
        info!(
            "Redelivered {} pairs of v{} to match {}",
            current.pairs.len(),
            current.version,
            match_id
        );
        Ok(PairingResponse::from(&current))
    }

    /// Check storage connectivity
    pub async fn health_check(&self) -> PairingResult<()> {
        self.repository.ping().await
    }

    async fn load_match(&self, match_id: MatchId) -> PairingResult<MatchInfo> {
        self.repository
            .find_match(match_id)
            .await?
            .ok_or(PairingError::MatchNotFound(match_id))
    }

    async fn current_record(&self, match_id: MatchId) -> PairingResult<PairingRecord> {
        self.load_match(match_id).await?;
        self.repository
            .current_record(match_id)
            .await?
            .ok_or(PairingError::NoPairing(match_id))
    }

    /// Paid or pending participants in join order
    async fn eligible_players(&self, info: &MatchInfo) -> PairingResult<Vec<EligiblePlayer>> {
        let mut players: Vec<EligiblePlayer> = self
            .directory
            .eligible_players(info.tournament_id)
            .await?
            .into_iter()
            .filter(|p| p.payment_status.is_eligible())
            .collect();
        players.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));

        if players.len() < self.settings.min_players {
            return Err(PairingError::Input(format!(
                "at least {} eligible players are required, found {}",
                self.settings.min_players,
                players.len()
            )));
        }
        Ok(players)
    }

    async fn run_algorithm(
        &self,
        info: &MatchInfo,
        players: Vec<EligiblePlayer>,
        request: &PairingRequest,
    ) -> PairingResult<AlgorithmOutput> {
        let seedings = self.directory.player_seedings(info.tournament_id).await?;
        let seeded = self
            .seeding
            .resolve(players, &seedings, request.seeding_method);

        let algorithm = PairingAlgorithm::for_format(info.format, &self.settings);
        debug!("Match {} uses {:?}", info.id, algorithm);
        Ok(algorithm.pair(&seeded))
    }

    async fn publish_record(
        &self,
        record: PairingRecord,
        actor: ActorId,
    ) -> PairingResult<PairingResponse> {
        let published = record.published(actor, Utc::now())?;
        self.transition(&published, record.status).await?;

        // The record stays published if the hand-off fails; `redeliver` retries it
        self.match_updater
            .assign_pairs(published.match_id, &published.pairs)
            .await
            .inspect_err(|e| {
                warn!(
                    "Match {} published v{} but pair hand-off failed: {}",
                    published.match_id, published.version, e
                )
            })?;

        Ok(PairingResponse::from(&published))
    }

    async fn transition(&self, record: &PairingRecord, from: PairingStatus) -> PairingResult<()> {
        self.repository
            .apply_transition(record, from)
            .await
            .inspect_err(|e| log_conflict(record.match_id, "transition", e))?;

        info!(
            "Pairing v{} for match {}: {} -> {}",
            record.version, record.match_id, from, record.status
        );
        Ok(())
    }
}

fn log_conflict(match_id: MatchId, operation: &str, err: &PairingError) {
    if let PairingError::Conflict { .. } = err {
        warn!("Concurrent {operation} on match {match_id} lost the race");
    }
}
