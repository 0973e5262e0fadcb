//! Pairing engine: seeding, pairing strategies and the approval workflow.

pub mod algorithms;
pub mod errors;
pub mod manager;
pub mod merge;
pub mod models;
pub mod seeding;
pub mod settings;
pub mod state;

pub use algorithms::{AlgorithmOutput, BracketType, PairingAlgorithm, PairingStrategy};
pub use errors::{PairingError, PairingResult};
pub use manager::PairingManager;
pub use merge::{manual_output, merge_overrides};
pub use models::{
    ActorId, BatchId, EligiblePlayer, MatchFormat, MatchId, MatchInfo, Pair, PairingId,
    PairingMetadata, PairingRecord, PairingRequest, PairingResponse, PairingStatusView,
    PairingType, PaymentStatus, PlayerSeeding, SeedingMethod, TournamentId, validate_pairs,
};
pub use seeding::{SeededShuffle, SeedingResolver, ShuffleSource, ThreadShuffle};
pub use settings::PairingSettings;
pub use state::{PairingAction, PairingStatus};
