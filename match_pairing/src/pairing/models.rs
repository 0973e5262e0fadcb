//! Pairing data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::errors::{PairingError, PairingResult};
use super::state::PairingStatus;

/// Match ID type
pub type MatchId = i64;

/// Tournament ID type
pub type TournamentId = i64;

/// Batch ID type
pub type BatchId = i64;

/// ID of the user performing a workflow action
pub type ActorId = i64;

/// Pairing record ID type
pub type PairingId = Uuid;

/// How the pair list of a request is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairingType {
    /// Pairs come from the match format's algorithm
    Auto,
    /// Pairs are supplied verbatim by the caller
    Manual,
    /// Algorithm output selectively overridden by caller pairs
    Hybrid,
}

impl fmt::Display for PairingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingType::Auto => write!(f, "auto"),
            PairingType::Manual => write!(f, "manual"),
            PairingType::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for PairingType {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(PairingType::Auto),
            "manual" => Ok(PairingType::Manual),
            "hybrid" => Ok(PairingType::Hybrid),
            other => Err(PairingError::InvalidStoredValue(format!(
                "pairing type '{other}'"
            ))),
        }
    }
}

/// Ordering applied to participants before automatic pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedingMethod {
    Random,
    RankBased,
    SkillBased,
    Custom,
}

impl fmt::Display for SeedingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedingMethod::Random => write!(f, "random"),
            SeedingMethod::RankBased => write!(f, "rank_based"),
            SeedingMethod::SkillBased => write!(f, "skill_based"),
            SeedingMethod::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for SeedingMethod {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(SeedingMethod::Random),
            "rank_based" => Ok(SeedingMethod::RankBased),
            "skill_based" => Ok(SeedingMethod::SkillBased),
            "custom" => Ok(SeedingMethod::Custom),
            other => Err(PairingError::InvalidStoredValue(format!(
                "seeding method '{other}'"
            ))),
        }
    }
}

/// Declared format of a match, selecting the pairing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    LeaderboardChallenge,
    Swiss,
    /// Fallback for formats without a dedicated algorithm
    Simple,
}

impl MatchFormat {
    /// Parse a stored match type. Unknown values fall back to [`MatchFormat::Simple`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "single_elimination" => MatchFormat::SingleElimination,
            "double_elimination" => MatchFormat::DoubleElimination,
            "round_robin" => MatchFormat::RoundRobin,
            "leaderboard" | "leaderboard_challenge" => MatchFormat::LeaderboardChallenge,
            "swiss" => MatchFormat::Swiss,
            _ => MatchFormat::Simple,
        }
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchFormat::SingleElimination => write!(f, "single_elimination"),
            MatchFormat::DoubleElimination => write!(f, "double_elimination"),
            MatchFormat::RoundRobin => write!(f, "round_robin"),
            MatchFormat::LeaderboardChallenge => write!(f, "leaderboard_challenge"),
            MatchFormat::Swiss => write!(f, "swiss"),
            MatchFormat::Simple => write!(f, "simple"),
        }
    }
}

/// Payment status of a tournament participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Whether a participant with this status may be paired
    pub fn is_eligible(self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Pending)
    }
}

impl FromStr for PaymentStatus {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(PairingError::InvalidStoredValue(format!(
                "payment status '{other}'"
            ))),
        }
    }
}

/// Tournament participant as returned by the participant directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligiblePlayer {
    /// External participant ID
    pub external_id: String,
    /// Display name
    pub name: String,
    /// When the participant joined the tournament
    pub joined_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
}

/// Per-tournament seeding data for one participant. Absent values mean unseeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeeding {
    pub external_id: String,
    pub seed_number: Option<i32>,
    pub skill_rating: Option<f64>,
}

/// Match as seen by the pairing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub batch_id: Option<BatchId>,
    pub format: MatchFormat,
    /// Pairing record the match currently treats as authoritative
    pub current_pairing_id: Option<PairingId>,
}

/// Two participants assigned to one slot of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub player1_id: String,
    pub player1_name: String,
    pub player2_id: String,
    pub player2_name: String,
    /// Sequence number, unique within a pairing record
    pub match_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_number: Option<u32>,
}

impl Pair {
    /// Pair two players under the given match number
    pub fn between(first: &EligiblePlayer, second: &EligiblePlayer, match_number: u32) -> Self {
        Self {
            player1_id: first.external_id.clone(),
            player1_name: first.name.clone(),
            player2_id: second.external_id.clone(),
            player2_name: second.name.clone(),
            match_number,
            table_number: None,
            round_number: None,
        }
    }

    /// Set the round number
    pub fn in_round(mut self, round: u32) -> Self {
        self.round_number = Some(round);
        self
    }

    /// Whether the given participant plays in this pair
    pub fn involves(&self, participant_id: &str) -> bool {
        self.player1_id == participant_id || self.player2_id == participant_id
    }

    fn validate(&self) -> PairingResult<()> {
        if self.player1_id.trim().is_empty() || self.player2_id.trim().is_empty() {
            return Err(PairingError::Input(format!(
                "pair #{} is missing a participant id",
                self.match_number
            )));
        }
        if self.player1_id == self.player2_id {
            return Err(PairingError::Input(format!(
                "pair #{} pairs participant {} with itself",
                self.match_number, self.player1_id
            )));
        }
        if self.match_number == 0 {
            return Err(PairingError::Input(
                "match_number must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validate a caller-supplied pair list
pub fn validate_pairs(pairs: &[Pair]) -> PairingResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(pairs.len());
    for pair in pairs {
        pair.validate()?;
        if !seen.insert(pair.match_number) {
            return Err(PairingError::Input(format!(
                "duplicate match_number {}",
                pair.match_number
            )));
        }
    }
    Ok(())
}

/// Request to generate a pairing for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRequest {
    pub match_id: MatchId,
    pub pairing_type: PairingType,
    pub seeding_method: SeedingMethod,
    /// Required when MANUAL, optional overrides when HYBRID
    #[serde(default)]
    pub custom_pairs: Option<Vec<Pair>>,
    #[serde(default)]
    pub force_regenerate: bool,
}

impl PairingRequest {
    /// Create an automatic pairing request
    pub fn auto(match_id: MatchId, seeding_method: SeedingMethod) -> Self {
        Self {
            match_id,
            pairing_type: PairingType::Auto,
            seeding_method,
            custom_pairs: None,
            force_regenerate: false,
        }
    }

    /// Attach caller-supplied pairs and switch to the given pairing type
    pub fn with_pairs(mut self, pairing_type: PairingType, pairs: Vec<Pair>) -> Self {
        self.pairing_type = pairing_type;
        self.custom_pairs = Some(pairs);
        self
    }

    /// Allow replacing an existing current record
    pub fn forced(mut self) -> Self {
        self.force_regenerate = true;
        self
    }

    /// Structural validation, independent of stored state
    pub fn validate(&self) -> PairingResult<()> {
        match (self.pairing_type, self.custom_pairs.as_deref()) {
            (PairingType::Manual, None) | (PairingType::Manual, Some([])) => Err(
                PairingError::Input("MANUAL pairing requires custom_pairs".to_string()),
            ),
            (PairingType::Manual | PairingType::Hybrid, Some(pairs)) => validate_pairs(pairs),
            _ => Ok(()),
        }
    }
}

/// Descriptive data produced alongside a pair list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_bye: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bye_player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds_needed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simultaneous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides_applied: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeding_method: Option<SeedingMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_format: Option<MatchFormat>,
}

/// One versioned snapshot of a match's pairs plus its workflow status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRecord {
    pub id: PairingId,
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub batch_id: Option<BatchId>,
    pub pairing_type: PairingType,
    pub seeding_method: SeedingMethod,
    /// Match format that drove generation
    pub algorithm_used: MatchFormat,
    pub pairs: Vec<Pair>,
    pub metadata: PairingMetadata,
    pub status: PairingStatus,
    /// Per-match version, starting at 1
    pub version: i32,
    pub proposed_by: ActorId,
    pub proposed_at: DateTime<Utc>,
    pub approved_by: Option<ActorId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub published_by: Option<ActorId>,
    pub published_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<ActorId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Response returned after generating or transitioning a pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingResponse {
    pub match_id: MatchId,
    pub pairing_id: PairingId,
    pub status: PairingStatus,
    pub version: i32,
    pub pairs: Vec<Pair>,
    pub total_pairs: usize,
    pub proposed_at: DateTime<Utc>,
    pub can_edit: bool,
    pub can_approve: bool,
    pub can_publish: bool,
    pub metadata: PairingMetadata,
}

impl From<&PairingRecord> for PairingResponse {
    fn from(record: &PairingRecord) -> Self {
        Self {
            match_id: record.match_id,
            pairing_id: record.id,
            status: record.status,
            version: record.version,
            pairs: record.pairs.clone(),
            total_pairs: record.pairs.len(),
            proposed_at: record.proposed_at,
            can_edit: record.status.can_edit(),
            can_approve: record.status.can_approve(),
            can_publish: record.status.can_publish(),
            metadata: record.metadata.clone(),
        }
    }
}

/// Workflow view of a match's pairing, used by status and history queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingStatusView {
    pub match_id: MatchId,
    pub has_pairing: bool,
    pub status: Option<PairingStatus>,
    pub pairing_id: Option<PairingId>,
    pub tournament_id: Option<TournamentId>,
    pub batch_id: Option<BatchId>,
    pub version: Option<i32>,
    pub pair_count: usize,
    pub proposed_by: Option<ActorId>,
    pub proposed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<ActorId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub published_by: Option<ActorId>,
    pub published_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<ActorId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl PairingStatusView {
    /// Explicit "no pairing yet" result
    pub fn none(match_id: MatchId) -> Self {
        Self {
            match_id,
            has_pairing: false,
            status: None,
            pairing_id: None,
            tournament_id: None,
            batch_id: None,
            version: None,
            pair_count: 0,
            proposed_by: None,
            proposed_at: None,
            approved_by: None,
            approved_at: None,
            published_by: None,
            published_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
        }
    }
}

impl From<&PairingRecord> for PairingStatusView {
    fn from(record: &PairingRecord) -> Self {
        Self {
            match_id: record.match_id,
            has_pairing: true,
            status: Some(record.status),
            pairing_id: Some(record.id),
            tournament_id: Some(record.tournament_id),
            batch_id: record.batch_id,
            version: Some(record.version),
            pair_count: record.pairs.len(),
            proposed_by: Some(record.proposed_by),
            proposed_at: Some(record.proposed_at),
            approved_by: record.approved_by,
            approved_at: record.approved_at,
            published_by: record.published_by,
            published_at: record.published_at,
            rejected_by: record.rejected_by,
            rejected_at: record.rejected_at,
            rejection_reason: record.rejection_reason.clone(),
        }
    }
}
