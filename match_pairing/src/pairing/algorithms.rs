//! Pairing strategies, one per match format.
//!
//! Every strategy consumes the seeded player list and returns the pairs plus
//! descriptive metadata. [`PairingAlgorithm`] is the closed set of strategies,
//! selected from a [`MatchFormat`] and dispatched with `enum_dispatch`.

use enum_dispatch::enum_dispatch;

use super::models::{EligiblePlayer, MatchFormat, Pair, PairingMetadata};
use super::settings::PairingSettings;

/// Pairs and metadata produced by a strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlgorithmOutput {
    pub pairs: Vec<Pair>,
    pub metadata: PairingMetadata,
}

/// A pairing strategy
#[enum_dispatch]
pub trait PairingStrategy {
    /// Pair the sorted `players`
    #[must_use]
    fn pair(&self, players: &[EligiblePlayer]) -> AlgorithmOutput;
}

/// Bracket flavour of an elimination match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketType {
    Single,
    Double,
}

impl BracketType {
    fn as_str(self) -> &'static str {
        match self {
            BracketType::Single => "single_elimination",
            BracketType::Double => "double_elimination",
        }
    }
}

/// Top seed against bottom seed, working inwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elimination {
    pub bracket: BracketType,
}

/// Every player against every other player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobin;

/// Small fields play round robin, large fields play simultaneously
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaderboard {
    pub pairwise_limit: usize,
}

/// First Swiss round: top half against bottom half
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swiss;

/// Consecutive players paired together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simple;

/// Closed set of pairing strategies
#[enum_dispatch(PairingStrategy)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingAlgorithm {
    Elimination,
    RoundRobin,
    Leaderboard,
    Swiss,
    Simple,
}

impl PairingAlgorithm {
    /// Strategy for a match format
    pub fn for_format(format: MatchFormat, settings: &PairingSettings) -> Self {
        match format {
            MatchFormat::SingleElimination => Elimination {
                bracket: BracketType::Single,
            }
            .into(),
            MatchFormat::DoubleElimination => Elimination {
                bracket: BracketType::Double,
            }
            .into(),
            MatchFormat::RoundRobin => RoundRobin.into(),
            MatchFormat::LeaderboardChallenge => Leaderboard {
                pairwise_limit: settings.leaderboard_pairwise_limit,
            }
            .into(),
            MatchFormat::Swiss => Swiss.into(),
            MatchFormat::Simple => Simple.into(),
        }
    }
}

/// 1-based pair number
fn number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

impl PairingStrategy for Elimination {
    fn pair(&self, players: &[EligiblePlayer]) -> AlgorithmOutput {
        let n = players.len();
        let pairs = (0..n / 2)
            .map(|i| Pair::between(&players[i], &players[n - 1 - i], number(i)).in_round(1))
            .collect::<Vec<_>>();

        let bye_player = (n % 2 == 1).then(|| players[n / 2].external_id.clone());

        AlgorithmOutput {
            metadata: PairingMetadata {
                algorithm: Some("elimination".to_string()),
                bracket_type: Some(self.bracket.as_str().to_string()),
                player_count: Some(n),
                has_bye: Some(bye_player.is_some()),
                bye_player,
                round: Some(1),
                ..Default::default()
            },
            pairs,
        }
    }
}

impl PairingStrategy for RoundRobin {
    fn pair(&self, players: &[EligiblePlayer]) -> AlgorithmOutput {
        let n = players.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push(Pair::between(&players[i], &players[j], number(pairs.len())));
            }
        }

        AlgorithmOutput {
            pairs,
            metadata: PairingMetadata {
                algorithm: Some("round_robin".to_string()),
                player_count: Some(n),
                rounds_needed: Some(n.saturating_sub(1) + n % 2),
                ..Default::default()
            },
        }
    }
}

impl PairingStrategy for Leaderboard {
    fn pair(&self, players: &[EligiblePlayer]) -> AlgorithmOutput {
        if players.len() <= self.pairwise_limit {
            return RoundRobin.pair(players);
        }

        AlgorithmOutput {
            pairs: Vec::new(),
            metadata: PairingMetadata {
                algorithm: Some("leaderboard".to_string()),
                player_count: Some(players.len()),
                simultaneous: Some(true),
                scoring_type: Some("individual".to_string()),
                ..Default::default()
            },
        }
    }
}

impl PairingStrategy for Swiss {
    // TODO: pair later rounds by standings once results are fed back into the engine
    fn pair(&self, players: &[EligiblePlayer]) -> AlgorithmOutput {
        let n = players.len();
        let half = n / 2;
        let pairs = (0..half)
            .map(|i| Pair::between(&players[i], &players[half + i], number(i)).in_round(1))
            .collect::<Vec<_>>();

        let bye_player = (n % 2 == 1).then(|| players[n - 1].external_id.clone());

        AlgorithmOutput {
            metadata: PairingMetadata {
                algorithm: Some("swiss".to_string()),
                player_count: Some(n),
                round: Some(1),
                has_bye: Some(bye_player.is_some()),
                bye_player,
                ..Default::default()
            },
            pairs,
        }
    }
}

impl PairingStrategy for Simple {
    fn pair(&self, players: &[EligiblePlayer]) -> AlgorithmOutput {
        let pairs = players
            .chunks_exact(2)
            .enumerate()
            .map(|(i, two)| Pair::between(&two[0], &two[1], number(i)).in_round(1))
            .collect::<Vec<_>>();

        let bye_player = (players.len() % 2 == 1)
            .then(|| players.last().map(|p| p.external_id.clone()))
            .flatten();

        AlgorithmOutput {
            metadata: PairingMetadata {
                algorithm: Some("simple".to_string()),
                player_count: Some(players.len()),
                has_bye: Some(bye_player.is_some()),
                bye_player,
                ..Default::default()
            },
            pairs,
        }
    }
}
