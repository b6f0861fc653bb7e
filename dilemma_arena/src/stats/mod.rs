//! Player statistics, standings points and rankings.
//!
//! Statistics are updated per result for both participants. Rankings sort by
//! tournament points, then win rate, average score and total points, with the
//! player id as a final tiebreak so the order is always total.

pub mod models;
pub mod tracker;

pub use models::{HeadToHeadRecord, PlayerStatistics, RankingEntry, TournamentSummary};
pub use tracker::{PlayerStatisticsTracker, ScoringRules, Standing};
