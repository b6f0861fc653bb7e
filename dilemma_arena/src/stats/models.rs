//! Player statistics and tournament summary models.

use crate::bracket::{MatchId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record against one specific opponent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_scored: u64,
    pub points_conceded: u64,
}

/// Running statistics of one player within a tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    pub matches_played: u32,
    pub matches_won: u32,
    pub matches_lost: u32,
    /// Sum of match scores
    pub total_points: u64,
    pub average_score: f64,
    pub cooperations: u64,
    pub betrayals: u64,
    /// Cooperations over all moves played
    pub cooperation_rate: f64,
    /// Betrayals over all moves played
    pub betrayal_rate: f64,
    /// Standings points awarded per result
    pub tournament_points: u32,
    pub byes_received: u32,
    pub total_duration_ms: u64,
    /// Keyed by opponent id
    pub head_to_head: HashMap<PlayerId, HeadToHeadRecord>,
}

impl PlayerStatistics {
    /// Wins over matches played, zero before the first match
    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            f64::from(self.matches_won) / f64::from(self.matches_played)
        }
    }

    pub fn total_moves(&self) -> u64 {
        self.cooperations.saturating_add(self.betrayals)
    }

    pub fn against(&self, opponent: PlayerId) -> Option<&HeadToHeadRecord> {
        self.head_to_head.get(&opponent)
    }
}

/// One line of the standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: String,
    pub tournament_points: u32,
    pub matches_won: u32,
    pub matches_lost: u32,
    pub win_rate: f64,
    pub average_score: f64,
    pub total_points: u64,
    pub eliminated: bool,
}

/// Aggregate figures for a finished (or running) tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub total_matches: u32,
    pub rounds_completed: u32,
    /// Sum of both players' scores over every match
    pub total_points: u64,
    pub average_match_score: f64,
    /// Cooperations over all moves by all players
    pub cooperation_rate: f64,
    pub total_duration_ms: u64,
    pub average_duration_ms: f64,
    pub highest_scoring_match: Option<MatchId>,
    pub highest_match_score: u64,
    pub forfeits: u32,
    pub byes: u32,
    /// Wall-clock time between start and end
    pub tournament_duration_ms: Option<i64>,
}
