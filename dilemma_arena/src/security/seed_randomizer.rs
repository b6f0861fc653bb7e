//! Seed randomization to prevent bracket position manipulation.

use crate::bracket::PlayerId;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Seed randomizer for elimination brackets
pub struct SeedRandomizer {
    rng: StdRng,
}

impl SeedRandomizer {
    /// Create a randomizer seeded from the thread RNG
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Create a deterministic randomizer, for replays and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform random permutation of `players`
    pub fn seed_players(&mut self, players: &[PlayerId]) -> Vec<PlayerId> {
        let mut seeded = players.to_vec();
        seeded.shuffle(&mut self.rng);
        seeded
    }
}

impl Default for SeedRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

/// How an elimination bracket orders its players before pairing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingPolicy {
    /// Fresh uniform shuffle per bracket
    #[default]
    Shuffled,
    /// Deterministic shuffle from a fixed seed
    Seeded(u64),
    /// Keep the roster order as given
    RosterOrder,
}

impl SeedingPolicy {
    pub fn apply(&self, players: &[PlayerId]) -> Vec<PlayerId> {
        match self {
            SeedingPolicy::Shuffled => SeedRandomizer::new().seed_players(players),
            SeedingPolicy::Seeded(seed) => SeedRandomizer::with_seed(*seed).seed_players(players),
            SeedingPolicy::RosterOrder => players.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_players_is_permutation() {
        let mut randomizer = SeedRandomizer::new();
        let players: Vec<PlayerId> = (1..=32).collect();

        let mut seeded = randomizer.seed_players(&players);
        assert_eq!(seeded.len(), 32);
        seeded.sort_unstable();
        assert_eq!(seeded, players);
    }

    #[test]
    fn test_seed_players_randomizes() {
        let mut randomizer = SeedRandomizer::new();
        let players: Vec<PlayerId> = (1..=32).collect();

        // 32! orderings; three identical draws in a row would mean no shuffling
        let first = randomizer.seed_players(&players);
        let second = randomizer.seed_players(&players);
        let third = randomizer.seed_players(&players);
        assert!(first != second || second != third);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let players: Vec<PlayerId> = (1..=16).collect();
        assert_eq!(
            SeedingPolicy::Seeded(42).apply(&players),
            SeedingPolicy::Seeded(42).apply(&players)
        );
    }

    #[test]
    fn test_roster_order_keeps_order() {
        assert_eq!(SeedingPolicy::RosterOrder.apply(&[5, 3, 9]), vec![5, 3, 9]);
    }

    #[test]
    fn test_empty_roster() {
        let mut randomizer = SeedRandomizer::default();
        assert!(randomizer.seed_players(&[]).is_empty());
        assert!(SeedingPolicy::default().apply(&[]).is_empty());
    }
}
