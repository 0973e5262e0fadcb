//! Approval workflow for pairing records.
//!
//! ```text
//! proposed ──approve──> approved ──publish──> published
//!     │
//!     └────reject────> rejected
//! ```
//!
//! Editing a proposed record never mutates it: it produces a new record with
//! the next version. Every other combination is an invalid transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::errors::{PairingError, PairingResult};
use super::models::{ActorId, Pair, PairingMetadata, PairingRecord};

/// Workflow status of a pairing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingStatus {
    Proposed,
    Approved,
    Published,
    Rejected,
}

/// Workflow operations applied to a match's current record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingAction {
    Generate,
    Edit,
    Approve,
    Publish,
    Reject,
}

impl PairingStatus {
    /// Status reached by applying `action`, or `InvalidState` if the action is illegal here
    pub fn next(self, action: PairingAction) -> PairingResult<PairingStatus> {
        match (self, action) {
            (PairingStatus::Proposed, PairingAction::Edit) => Ok(PairingStatus::Proposed),
            (PairingStatus::Proposed, PairingAction::Approve) => Ok(PairingStatus::Approved),
            (PairingStatus::Proposed, PairingAction::Reject) => Ok(PairingStatus::Rejected),
            (PairingStatus::Approved, PairingAction::Publish) => Ok(PairingStatus::Published),
            (status, action) => Err(PairingError::InvalidState { action, status }),
        }
    }

    pub fn can_edit(self) -> bool {
        self == PairingStatus::Proposed
    }

    pub fn can_approve(self) -> bool {
        self == PairingStatus::Proposed
    }

    pub fn can_publish(self) -> bool {
        self == PairingStatus::Approved
    }

    /// Published and rejected records accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, PairingStatus::Published | PairingStatus::Rejected)
    }
}

impl fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingStatus::Proposed => write!(f, "proposed"),
            PairingStatus::Approved => write!(f, "approved"),
            PairingStatus::Published => write!(f, "published"),
            PairingStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for PairingStatus {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(PairingStatus::Proposed),
            "approved" => Ok(PairingStatus::Approved),
            "published" => Ok(PairingStatus::Published),
            "rejected" => Ok(PairingStatus::Rejected),
            other => Err(PairingError::InvalidStoredValue(format!(
                "pairing status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PairingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingAction::Generate => write!(f, "generate"),
            PairingAction::Edit => write!(f, "edit"),
            PairingAction::Approve => write!(f, "approve"),
            PairingAction::Publish => write!(f, "publish"),
            PairingAction::Reject => write!(f, "reject"),
        }
    }
}

impl PairingRecord {
    /// Copy of this record in approved status
    pub fn approved(&self, actor: ActorId, at: DateTime<Utc>) -> PairingResult<Self> {
        let status = self.status.next(PairingAction::Approve)?;
        Ok(Self {
            status,
            approved_by: Some(actor),
            approved_at: Some(at),
            ..self.clone()
        })
    }

    /// Copy of this record in published status
    pub fn published(&self, actor: ActorId, at: DateTime<Utc>) -> PairingResult<Self> {
        let status = self.status.next(PairingAction::Publish)?;
        Ok(Self {
            status,
            published_by: Some(actor),
            published_at: Some(at),
            ..self.clone()
        })
    }

    /// Copy of this record in rejected status. The reason must not be blank.
    pub fn rejected(&self, actor: ActorId, at: DateTime<Utc>, reason: &str) -> PairingResult<Self> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PairingError::Input(
                "a rejection reason is required".to_string(),
            ));
        }
        let status = self.status.next(PairingAction::Reject)?;
        Ok(Self {
            status,
            rejected_by: Some(actor),
            rejected_at: Some(at),
            rejection_reason: Some(reason.to_string()),
            ..self.clone()
        })
    }

    /// New proposed record replacing this one's pairs.
    ///
    /// Match, tournament, batch, type, seeding and algorithm carry over; the
    /// result gets a fresh identity and the next version.
    pub fn revised(&self, pairs: Vec<Pair>, actor: ActorId, at: DateTime<Utc>) -> PairingResult<Self> {
        self.status.next(PairingAction::Edit)?;
        // The old bye only stands if the edit left that player unpaired
        let bye_player = self
            .metadata
            .bye_player
            .clone()
            .filter(|id| !pairs.iter().any(|p| p.involves(id)));
        let metadata = PairingMetadata {
            pair_count: Some(pairs.len()),
            has_bye: self.metadata.has_bye.map(|_| bye_player.is_some()),
            bye_player,
            overrides_applied: None,
            edited: Some(true),
            ..self.metadata.clone()
        };
        Ok(Self {
            id: Uuid::new_v4(),
            match_id: self.match_id,
            tournament_id: self.tournament_id,
            batch_id: self.batch_id,
            pairing_type: self.pairing_type,
            seeding_method: self.seeding_method,
            algorithm_used: self.algorithm_used,
            pairs,
            metadata,
            status: PairingStatus::Proposed,
            version: self.version + 1,
            proposed_by: actor,
            proposed_at: at,
            approved_by: None,
            approved_at: None,
            published_by: None,
            published_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
        })
    }
}
