//! Anti-collusion detection with shadow flagging.
//!
//! The detector only records flags for later review. It never rejects a
//! result or changes tournament state.

use super::errors::{AntiCollusionError, AntiCollusionResult};
use crate::bracket::{MatchResult, PlayerId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::RwLock;

/// Collusion flag severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for FlagSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagSeverity::Low => write!(f, "low"),
            FlagSeverity::Medium => write!(f, "medium"),
            FlagSeverity::High => write!(f, "high"),
        }
    }
}

/// Collusion flag types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    /// Loser scored nothing while the winner ran up the score
    ScoreDumping,

    /// The same player keeps forfeiting to the same opponent
    RepeatedForfeits,

    /// One player wins almost every meeting with the same opponent
    WinRateAnomaly,
}

impl std::fmt::Display for FlagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagType::ScoreDumping => write!(f, "score_dumping"),
            FlagType::RepeatedForfeits => write!(f, "repeated_forfeits"),
            FlagType::WinRateAnomaly => write!(f, "win_rate_anomaly"),
        }
    }
}

impl std::str::FromStr for FlagType {
    type Err = AntiCollusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score_dumping" => Ok(FlagType::ScoreDumping),
            "repeated_forfeits" => Ok(FlagType::RepeatedForfeits),
            "win_rate_anomaly" => Ok(FlagType::WinRateAnomaly),
            other => Err(AntiCollusionError::InvalidFlagType(other.to_string())),
        }
    }
}

/// Collusion flag record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollusionFlag {
    pub id: u64,
    /// The player suspected of benefiting
    pub player_id: PlayerId,
    pub opponent_id: PlayerId,
    pub tournament_id: TournamentId,
    pub flag_type: FlagType,
    pub severity: FlagSeverity,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub reviewed: bool,
    pub reviewer_id: Option<PlayerId>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollusionThresholds {
    /// Minimum winner score for a zero-point loss to count as dumping
    pub score_dumping_min_winner_score: u32,
    /// Forfeits between the same two players before flagging
    pub repeated_forfeit_count: u32,
    /// Head-to-head win rate above which a pairing is flagged
    pub win_rate_threshold: f64,
    /// Meetings needed before the win rate is considered
    pub win_rate_min_matches: u32,
}

impl Default for CollusionThresholds {
    fn default() -> Self {
        Self {
            score_dumping_min_winner_score: 30,
            repeated_forfeit_count: 2,
            win_rate_threshold: 0.80,
            win_rate_min_matches: 5,
        }
    }
}

/// Meetings between two players, keyed by the ordered pair
#[derive(Debug, Clone, Copy, Default)]
struct PairHistory {
    matches: u32,
    /// Wins of the lower player id
    low_wins: u32,
    /// Forfeits by the lower player id
    low_forfeits: u32,
    /// Forfeits by the higher player id
    high_forfeits: u32,
    win_rate_flagged: bool,
}

/// Anti-collusion detector
pub struct AntiCollusionDetector {
    thresholds: CollusionThresholds,

    flags: Arc<RwLock<Vec<CollusionFlag>>>,

    /// Head-to-head history across every tournament this detector has seen
    pairs: Arc<RwLock<HashMap<(PlayerId, PlayerId), PairHistory>>>,

    next_flag_id: AtomicU64,
}

impl AntiCollusionDetector {
    pub fn new(thresholds: CollusionThresholds) -> Self {
        Self {
            thresholds,
            flags: Arc::new(RwLock::new(Vec::new())),
            pairs: Arc::new(RwLock::new(HashMap::new())),
            next_flag_id: AtomicU64::new(1),
        }
    }

    pub fn thresholds(&self) -> &CollusionThresholds {
        &self.thresholds
    }

    /// Analyze a completed match and return any flags it raised
    pub async fn analyze_result(
        &self,
        tournament_id: TournamentId,
        result: &MatchResult,
    ) -> Vec<CollusionFlag> {
        let winner = result.winner_id;
        let loser = result.loser_id();
        let mut raised = Vec::new();

        if !result.forfeit
            && result.loser_score() == 0
            && result.winner_score() >= self.thresholds.score_dumping_min_winner_score
        {
            raised.push(self.build_flag(
                tournament_id,
                winner,
                loser,
                FlagType::ScoreDumping,
                FlagSeverity::Low,
                serde_json::json!({
                    "match_id": result.match_id,
                    "winner_score": result.winner_score(),
                    "loser_score": 0
                }),
            ));
        }

        let key = (winner.min(loser), winner.max(loser));
        let history = {
            let mut pairs = self.pairs.write().await;
            let history = pairs.entry(key).or_default();
            history.matches += 1;
            if winner == key.0 {
                history.low_wins += 1;
            }
            if result.forfeit {
                if loser == key.0 {
                    history.low_forfeits += 1;
                } else {
                    history.high_forfeits += 1;
                }
            }
            *history
        };

        let forfeits = if loser == key.0 {
            history.low_forfeits
        } else {
            history.high_forfeits
        };
        if result.forfeit && forfeits == self.thresholds.repeated_forfeit_count {
            raised.push(self.build_flag(
                tournament_id,
                winner,
                loser,
                FlagType::RepeatedForfeits,
                FlagSeverity::High,
                serde_json::json!({
                    "match_id": result.match_id,
                    "forfeits": forfeits
                }),
            ));
        }

        if !history.win_rate_flagged && history.matches >= self.thresholds.win_rate_min_matches {
            let low_rate = f64::from(history.low_wins) / f64::from(history.matches);
            let dominant = if low_rate > self.thresholds.win_rate_threshold {
                Some((key.0, key.1, low_rate))
            } else if 1.0 - low_rate > self.thresholds.win_rate_threshold {
                Some((key.1, key.0, 1.0 - low_rate))
            } else {
                None
            };

            if let Some((player, opponent, win_rate)) = dominant {
                if let Some(entry) = self.pairs.write().await.get_mut(&key) {
                    entry.win_rate_flagged = true;
                }
                raised.push(self.build_flag(
                    tournament_id,
                    player,
                    opponent,
                    FlagType::WinRateAnomaly,
                    FlagSeverity::Medium,
                    serde_json::json!({
                        "matches": history.matches,
                        "win_rate": win_rate
                    }),
                ));
            }
        }

        if !raised.is_empty() {
            for flag in &raised {
                log::warn!(
                    "Collusion flag created: player={}, opponent={}, tournament={}, type={}, severity={}",
                    flag.player_id,
                    flag.opponent_id,
                    flag.tournament_id,
                    flag.flag_type,
                    flag.severity
                );
            }
            self.flags.write().await.extend(raised.iter().cloned());
        }

        raised
    }

    fn build_flag(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        opponent_id: PlayerId,
        flag_type: FlagType,
        severity: FlagSeverity,
        details: serde_json::Value,
    ) -> CollusionFlag {
        CollusionFlag {
            id: self.next_flag_id.fetch_add(1, Ordering::Relaxed),
            player_id,
            opponent_id,
            tournament_id,
            flag_type,
            severity,
            details,
            created_at: Utc::now(),
            reviewed: false,
            reviewer_id: None,
            reviewed_at: None,
        }
    }

    /// Every flag, oldest first
    pub async fn all_flags(&self) -> Vec<CollusionFlag> {
        self.flags.read().await.clone()
    }

    /// Unreviewed flags, newest first
    pub async fn get_unreviewed_flags(&self) -> Vec<CollusionFlag> {
        self.flags
            .read()
            .await
            .iter()
            .rev()
            .filter(|f| !f.reviewed)
            .cloned()
            .collect()
    }

    /// Flags raised against a player, newest first
    pub async fn get_player_flags(&self, player_id: PlayerId) -> Vec<CollusionFlag> {
        self.flags
            .read()
            .await
            .iter()
            .rev()
            .filter(|f| f.player_id == player_id)
            .cloned()
            .collect()
    }

    /// Mark flag as reviewed
    pub async fn mark_flag_reviewed(
        &self,
        flag_id: u64,
        reviewer_id: PlayerId,
    ) -> AntiCollusionResult<()> {
        let mut flags = self.flags.write().await;
        let flag = flags
            .iter_mut()
            .find(|f| f.id == flag_id)
            .ok_or(AntiCollusionError::FlagNotFound(flag_id))?;

        if flag.reviewed {
            return Err(AntiCollusionError::AlreadyReviewed(flag_id));
        }
        flag.reviewed = true;
        flag.reviewer_id = Some(reviewer_id);
        flag.reviewed_at = Some(Utc::now());
        Ok(())
    }
}

impl Default for AntiCollusionDetector {
    fn default() -> Self {
        Self::new(CollusionThresholds::default())
    }
}
