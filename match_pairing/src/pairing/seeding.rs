//! Seeding: ordering participants before automatic pairing.

use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::{cmp::Ordering, collections::HashMap, sync::Arc, sync::Mutex};

use super::models::{EligiblePlayer, PlayerSeeding, SeedingMethod};

/// Source of randomness for RANDOM seeding
pub trait ShuffleSource: Send + Sync {
    /// Permute `players` uniformly at random
    fn shuffle(&self, players: &mut [EligiblePlayer]);
}

/// Shuffles with the thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadShuffle;

impl ShuffleSource for ThreadShuffle {
    fn shuffle(&self, players: &mut [EligiblePlayer]) {
        players.shuffle(&mut rand::rng());
    }
}

/// Deterministic shuffles from a fixed seed
#[derive(Debug)]
pub struct SeededShuffle {
    rng: Mutex<StdRng>,
}

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ShuffleSource for SeededShuffle {
    fn shuffle(&self, players: &mut [EligiblePlayer]) {
        // A poisoned lock still holds a usable generator
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        players.shuffle(&mut *rng);
    }
}

/// Orders a player list according to a seeding method
#[derive(Clone)]
pub struct SeedingResolver {
    shuffle: Arc<dyn ShuffleSource>,
}

impl SeedingResolver {
    pub fn new(shuffle: Arc<dyn ShuffleSource>) -> Self {
        Self { shuffle }
    }

    /// Order `players` by `method`. Only the order changes, never the players.
    ///
    /// - `RankBased`: ascending seed number, unseeded last
    /// - `SkillBased`: descending skill rating, unrated last
    /// - `Random`: uniform permutation
    /// - `Custom`: unchanged
    ///
    /// Ties and unseeded players are ordered by join time.
    pub fn resolve(
        &self,
        mut players: Vec<EligiblePlayer>,
        seedings: &[PlayerSeeding],
        method: SeedingMethod,
    ) -> Vec<EligiblePlayer> {
        let by_id: HashMap<&str, &PlayerSeeding> = seedings
            .iter()
            .map(|s| (s.external_id.as_str(), s))
            .collect();

        match method {
            SeedingMethod::RankBased => {
                let seed = |p: &EligiblePlayer| {
                    by_id.get(p.external_id.as_str()).and_then(|s| s.seed_number)
                };
                players.sort_by(|a, b| {
                    unseeded_last(seed(a), seed(b), |x, y| x.cmp(&y))
                        .then_with(|| a.joined_at.cmp(&b.joined_at))
                });
            }
            SeedingMethod::SkillBased => {
                let rating = |p: &EligiblePlayer| {
                    by_id
                        .get(p.external_id.as_str())
                        .and_then(|s| s.skill_rating)
                };
                players.sort_by(|a, b| {
                    unseeded_last(rating(a), rating(b), |x, y| y.total_cmp(&x))
                        .then_with(|| a.joined_at.cmp(&b.joined_at))
                });
            }
            SeedingMethod::Random => self.shuffle.shuffle(&mut players),
            SeedingMethod::Custom => {}
        }

        debug!(
            "Seeded {} players by {}: {:?}",
            players.len(),
            method,
            players.iter().map(|p| p.external_id.as_str()).collect::<Vec<_>>()
        );
        players
    }
}

/// Compare optional keys, placing `None` after every `Some`
fn unseeded_last<T: Copy>(a: Option<T>, b: Option<T>, cmp: impl Fn(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
