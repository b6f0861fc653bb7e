//! Engine configuration.

use super::errors::{TournamentError, TournamentResult};
use crate::security::{
    CollusionThresholds, DEFAULT_MAX_MATCH_SCORE, DEFAULT_MAX_MOVES_PER_MATCH,
    DEFAULT_MAX_POINTS_PER_MOVE,
};
use crate::stats::ScoringRules;
use serde::{Deserialize, Serialize};

/// Hard ceiling on roster size
pub const ABSOLUTE_MAX_PLAYERS: usize = 4096;

/// Tournament engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum roster size (default: 4)
    pub min_players: usize,

    /// Maximum roster size (default: 256)
    pub max_players: usize,

    /// Capacity of each tournament actor's inbox
    pub mailbox_capacity: usize,

    /// Most points one move can earn
    pub max_points_per_move: u32,

    /// Most points one player can score in a match
    pub max_match_score: u32,

    /// Most moves one player can make in a match
    pub max_moves_per_match: u32,

    pub scoring: ScoringRules,

    pub collusion: CollusionThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_players: 4,
            max_players: 256,
            mailbox_capacity: 100,
            max_points_per_move: DEFAULT_MAX_POINTS_PER_MOVE,
            max_match_score: DEFAULT_MAX_MATCH_SCORE,
            max_moves_per_match: DEFAULT_MAX_MOVES_PER_MATCH,
            scoring: ScoringRules::default(),
            collusion: CollusionThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `ARENA_*` environment variables, defaulting anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_players: parse_env_or("ARENA_MIN_PLAYERS", defaults.min_players),
            max_players: parse_env_or("ARENA_MAX_PLAYERS", defaults.max_players),
            mailbox_capacity: parse_env_or("ARENA_MAILBOX_CAPACITY", defaults.mailbox_capacity),
            max_points_per_move: parse_env_or(
                "ARENA_MAX_POINTS_PER_MOVE",
                defaults.max_points_per_move,
            ),
            max_match_score: parse_env_or("ARENA_MAX_MATCH_SCORE", defaults.max_match_score),
            max_moves_per_match: parse_env_or(
                "ARENA_MAX_MOVES_PER_MATCH",
                defaults.max_moves_per_match,
            ),
            scoring: defaults.scoring,
            collusion: CollusionThresholds {
                score_dumping_min_winner_score: parse_env_or(
                    "ARENA_COLLUSION_DUMPING_SCORE",
                    defaults.collusion.score_dumping_min_winner_score,
                ),
                repeated_forfeit_count: parse_env_or(
                    "ARENA_COLLUSION_FORFEITS",
                    defaults.collusion.repeated_forfeit_count,
                ),
                win_rate_threshold: parse_env_or(
                    "ARENA_COLLUSION_WIN_RATE",
                    defaults.collusion.win_rate_threshold,
                ),
                win_rate_min_matches: parse_env_or(
                    "ARENA_COLLUSION_MIN_MATCHES",
                    defaults.collusion.win_rate_min_matches,
                ),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> TournamentResult<()> {
        if self.min_players < 2 {
            return Err(TournamentError::InvalidConfig(
                "Min players must be at least 2".to_string(),
            ));
        }

        if self.max_players < self.min_players {
            return Err(TournamentError::InvalidConfig(format!(
                "Max players must be at least min players ({})",
                self.min_players
            )));
        }

        if self.max_players > ABSOLUTE_MAX_PLAYERS {
            return Err(TournamentError::InvalidConfig(format!(
                "Max players must be at most {ABSOLUTE_MAX_PLAYERS}"
            )));
        }

        if self.mailbox_capacity == 0 {
            return Err(TournamentError::InvalidConfig(
                "Mailbox capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_points_per_move == 0
            || self.max_match_score == 0
            || self.max_moves_per_match == 0
        {
            return Err(TournamentError::InvalidConfig(
                "Score limits must be greater than 0".to_string(),
            ));
        }

        if !(0.5..=1.0).contains(&self.collusion.win_rate_threshold) {
            return Err(TournamentError::InvalidConfig(
                "Collusion win rate threshold must be between 0.5 and 1.0".to_string(),
            ));
        }

        if self.collusion.repeated_forfeit_count == 0 || self.collusion.win_rate_min_matches == 0 {
            return Err(TournamentError::InvalidConfig(
                "Collusion counts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
