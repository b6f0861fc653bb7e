//! Bracket generation and match progression.
//!
//! Each tournament format is a strategy implementing [`BracketGenerator`]:
//! - [`SingleElimination`]: one loss eliminates, winners advance until one remains
//! - [`DoubleElimination`]: winners ladder, losers ladder and a grand final
//! - [`RoundRobin`]: circle-method schedule, everybody plays everybody once
//!
//! Generators are pure: they build a [`Bracket`] from a player list and turn a
//! [`MatchResult`] into a [`BracketUpdate`] holding the new bracket value. The
//! input bracket is never modified, so a rejected result leaves state untouched.
//!
//! ## Example
//!
//! ```
//! use dilemma_arena::bracket::{BracketGenerator, Generator, TournamentFormat};
//! use uuid::Uuid;
//!
//! let generator = Generator::for_format(TournamentFormat::RoundRobin);
//! let bracket = generator.generate_bracket(Uuid::new_v4(), &[1, 2, 3, 4]);
//!
//! assert_eq!(bracket.rounds.len(), 3);
//! assert_eq!(bracket.total_matches(), 6);
//! ```

pub mod double_elimination;
pub mod models;
pub mod round_robin;
pub mod single_elimination;

pub use double_elimination::DoubleElimination;
pub use models::{
    ActiveMatch, Bracket, Ladder, Match, MatchId, MatchPairing, MatchResult, MatchStatistics,
    MatchStatus, PlayerId, Round, RoundStatus, TournamentFormat, TournamentId,
};
pub use round_robin::RoundRobin;
pub use single_elimination::SingleElimination;

use crate::security::SeedingPolicy;
use chrono::{DateTime, Utc};
use enum_dispatch::enum_dispatch;
use thiserror::Error;

/// Bracket errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Match already completed: {0}")]
    MatchAlreadyCompleted(MatchId),

    #[error("Result players do not match the pairing of match {0}")]
    PlayerMismatch(MatchId),

    #[error("Winner {winner} did not play in match {match_id}")]
    WinnerNotParticipant { match_id: MatchId, winner: PlayerId },

    #[error("Unsupported tournament format: {0}")]
    UnsupportedFormat(String),
}

pub type BracketResult<T> = Result<T, BracketError>;

/// Delta produced by applying one match result
#[derive(Debug, Clone)]
pub struct BracketUpdate {
    /// The bracket after the result was applied
    pub bracket: Bracket,
    /// Players eliminated by this result
    pub eliminated_players: Vec<PlayerId>,
    /// Pairings of rounds that became ready because of this result
    pub next_matches: Vec<MatchPairing>,
    /// Rounds completed by this result (including bye-only rounds)
    pub completed_rounds: Vec<u32>,
    /// Populated rounds that can now be armed
    pub ready_rounds: Vec<u32>,
    /// Whether the bracket reached its completion condition
    pub is_complete: bool,
}

impl BracketUpdate {
    fn new(bracket: Bracket) -> Self {
        Self {
            bracket,
            eliminated_players: Vec::new(),
            next_matches: Vec::new(),
            completed_rounds: Vec::new(),
            ready_rounds: Vec::new(),
            is_complete: false,
        }
    }

    /// Fill in the derived fields once the bracket has been fully updated
    fn finish(mut self, is_complete: bool) -> Self {
        self.next_matches = self.bracket.pairings_for_rounds(&self.ready_rounds);
        self.is_complete = is_complete;
        self
    }
}

/// Shared capability set of every tournament format
#[enum_dispatch]
pub trait BracketGenerator {
    /// Format implemented by this generator
    fn format(&self) -> TournamentFormat;

    /// Number of rounds a bracket for `player_count` players has
    fn total_rounds(&self, player_count: usize) -> u32;

    /// Build the initial bracket
    fn generate_bracket(&self, tournament_id: TournamentId, players: &[PlayerId]) -> Bracket;

    /// Apply a result to a copy of `bracket` and describe what changed
    fn process_match_result(
        &self,
        result: &MatchResult,
        bracket: &Bracket,
    ) -> BracketResult<BracketUpdate>;

    /// Pairings ready to be played next
    fn get_next_matches(&self, bracket: &Bracket) -> Vec<MatchPairing> {
        bracket.ready_pairings()
    }

    /// Whether the bracket reached its completion condition
    fn is_complete(&self, bracket: &Bracket) -> bool;

    /// Champion decided by the bracket itself, if the format has one
    fn champion(&self, bracket: &Bracket) -> Option<PlayerId> {
        match bracket.players.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// Generator selected by tournament format
#[enum_dispatch(BracketGenerator)]
#[derive(Debug, Clone)]
pub enum Generator {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl Generator {
    /// Generator for a format, shuffling players for elimination formats
    pub fn for_format(format: TournamentFormat) -> Self {
        Self::with_seeding(format, SeedingPolicy::default())
    }

    /// Generator for a format with an explicit seeding policy
    pub fn with_seeding(format: TournamentFormat, seeding: SeedingPolicy) -> Self {
        match format {
            TournamentFormat::SingleElimination => SingleElimination::new(seeding).into(),
            TournamentFormat::DoubleElimination => DoubleElimination::new(seeding).into(),
            TournamentFormat::RoundRobin => RoundRobin::new().into(),
        }
    }
}

/// `ceil(log2(n))`, zero for fewer than two players
pub(crate) fn elimination_rounds(player_count: usize) -> u32 {
    if player_count <= 1 {
        0
    } else {
        usize::BITS - (player_count - 1).leading_zeros()
    }
}

/// Where a recorded result landed
pub(crate) struct RecordedResult {
    pub round_index: usize,
    pub loser: PlayerId,
}

/// Record `result` on its match, count the loss and drop the active match context.
///
/// Checks that the match exists, is still open and that the result names the
/// same players and a participating winner.
pub(crate) fn record_result(
    bracket: &mut Bracket,
    result: &MatchResult,
    now: DateTime<Utc>,
) -> BracketResult<RecordedResult> {
    let (round_index, match_index) = bracket
        .locate_match(result.match_id)
        .ok_or(BracketError::MatchNotFound(result.match_id))?;

    let game = &mut bracket.rounds[round_index].matches[match_index];
    if game.is_completed() {
        return Err(BracketError::MatchAlreadyCompleted(game.id));
    }
    if !game.has_players(result.player1_id, result.player2_id) {
        return Err(BracketError::PlayerMismatch(game.id));
    }
    if !game.involves(result.winner_id) {
        return Err(BracketError::WinnerNotParticipant {
            match_id: game.id,
            winner: result.winner_id,
        });
    }

    game.status = MatchStatus::Completed;
    game.result = Some(result.clone());
    game.started_at.get_or_insert(now);
    game.completed_at = Some(now);

    let loser = result.loser_id();
    *bracket.losses.entry(loser).or_insert(0) += 1;
    bracket.active_matches.remove(&result.match_id);

    Ok(RecordedResult { round_index, loser })
}


#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_elimination_rounds() {
        assert_eq!(elimination_rounds(0), 0);
        assert_eq!(elimination_rounds(1), 0);
        assert_eq!(elimination_rounds(2), 1);
        assert_eq!(elimination_rounds(3), 2);
        assert_eq!(elimination_rounds(4), 2);
        assert_eq!(elimination_rounds(5), 3);
        assert_eq!(elimination_rounds(8), 3);
        assert_eq!(elimination_rounds(9), 4);
        assert_eq!(elimination_rounds(1024), 10);
    }

    #[test]
    fn test_factory_selects_generator() {
        for format in [
            TournamentFormat::SingleElimination,
            TournamentFormat::DoubleElimination,
            TournamentFormat::RoundRobin,
        ] {
            assert_eq!(Generator::for_format(format).format(), format);
        }
    }

    #[test]
    fn test_record_result_rejects_unknown_match() {
        let generator = Generator::with_seeding(
            TournamentFormat::SingleElimination,
            SeedingPolicy::RosterOrder,
        );
        let mut bracket = generator.generate_bracket(Uuid::new_v4(), &[1, 2, 3, 4]);
        let mut result = test_support::win(&bracket.rounds[0].matches[0], 1);
        result.match_id = Uuid::new_v4();

        let err = record_result(&mut bracket, &result, Utc::now()).err();
        assert_eq!(err, Some(BracketError::MatchNotFound(result.match_id)));
    }

    #[test]
    fn test_record_result_rejects_outsider_winner() {
        let generator = Generator::with_seeding(
            TournamentFormat::SingleElimination,
            SeedingPolicy::RosterOrder,
        );
        let mut bracket = generator.generate_bracket(Uuid::new_v4(), &[1, 2, 3, 4]);
        let mut result = test_support::win(&bracket.rounds[0].matches[0], 1);
        result.winner_id = 3;

        assert!(matches!(
            record_result(&mut bracket, &result, Utc::now()),
            Err(BracketError::WinnerNotParticipant { winner: 3, .. })
        ));
    }

    #[test]
    fn test_record_result_counts_loss_and_rejects_replay() {
        let generator = Generator::with_seeding(
            TournamentFormat::SingleElimination,
            SeedingPolicy::RosterOrder,
        );
        let mut bracket = generator.generate_bracket(Uuid::new_v4(), &[1, 2, 3, 4]);
        let result = test_support::win(&bracket.rounds[0].matches[0], 2);

        let recorded = record_result(&mut bracket, &result, Utc::now()).unwrap();
        assert_eq!(recorded.loser, 1);
        assert_eq!(recorded.round_index, 0);
        assert_eq!(bracket.losses_for(1), 1);

        assert_eq!(
            record_result(&mut bracket, &result, Utc::now()).err(),
            Some(BracketError::MatchAlreadyCompleted(result.match_id))
        );
    }
}
