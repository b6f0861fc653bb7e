//! Structural bracket checks and match result validation.
//!
//! Results arrive from an external game-execution collaborator and are
//! checked against the bracket before anything is applied.

use super::errors::{IntegrityError, ResultValidationError};
use crate::bracket::{Bracket, MatchResult, PlayerId, RoundStatus};
use std::collections::HashSet;

/// Default upper bound on points a player can earn in one move
pub const DEFAULT_MAX_POINTS_PER_MOVE: u32 = 5;

/// Default upper bound on a single player's match score
pub const DEFAULT_MAX_MATCH_SCORE: u32 = 10_000;

/// Default upper bound on moves per player in one match
pub const DEFAULT_MAX_MOVES_PER_MATCH: u32 = 10_000;

/// Validates bracket structure and incoming match results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityValidator {
    max_points_per_move: u32,
    max_match_score: u32,
    max_moves_per_match: u32,
}

impl IntegrityValidator {
    pub fn new(max_points_per_move: u32, max_match_score: u32, max_moves_per_match: u32) -> Self {
        Self {
            max_points_per_move,
            max_match_score,
            max_moves_per_match,
        }
    }

    /// Check a bracket's structure.
    ///
    /// Verifies unique seeding, the fixed round count, sequential round
    /// numbering, that every scheduled player is on the roster and appears at
    /// most once per round, that no eliminated player waits in an open match,
    /// and that nobody is in two active matches.
    pub fn validate_bracket(
        &self,
        bracket: &Bracket,
        expected_rounds: u32,
    ) -> Result<(), IntegrityError> {
        let mut roster = HashSet::with_capacity(bracket.players.len());
        for &player in &bracket.players {
            if !roster.insert(player) {
                return Err(IntegrityError::DuplicatePlayer(player));
            }
        }

        let actual = bracket.rounds.len() as u32;
        if actual != expected_rounds {
            return Err(IntegrityError::RoundCountMismatch {
                expected: expected_rounds,
                actual,
            });
        }

        for (position, round) in (1u32..).zip(&bracket.rounds) {
            if round.number != position {
                return Err(IntegrityError::RoundNumbering {
                    position,
                    number: round.number,
                });
            }

            let mut seated = HashSet::new();
            let mut seat = |player: PlayerId| {
                if !roster.contains(&player) {
                    return Err(IntegrityError::UnknownPlayer {
                        round: round.number,
                        player,
                    });
                }
                if !seated.insert(player) {
                    return Err(IntegrityError::PlayerRepeatedInRound {
                        round: round.number,
                        player,
                    });
                }
                Ok(())
            };

            for game in &round.matches {
                if game.player1 == game.player2 {
                    return Err(IntegrityError::SelfPairing {
                        match_id: game.id,
                        round: round.number,
                        player: game.player1,
                    });
                }
                seat(game.player1)?;
                seat(game.player2)?;
            }
            for &bye in &round.byes {
                seat(bye)?;
            }

            if let Some(player) = round
                .matches
                .iter()
                .filter(|m| !m.is_completed())
                .flat_map(|m| [m.player1, m.player2])
                .find(|p| bracket.is_eliminated(*p))
            {
                return Err(IntegrityError::EliminatedPlayerScheduled {
                    round: round.number,
                    player,
                });
            }
        }

        let mut active = HashSet::new();
        for context in bracket.active_matches.values() {
            for player in [context.player1, context.player2] {
                if !active.insert(player) {
                    return Err(IntegrityError::PlayerInMultipleMatches(player));
                }
            }
        }

        Ok(())
    }

    /// Check a submitted result against the bracket and the active match context.
    ///
    /// Forfeits skip the score ordering check since the winner is designated.
    pub fn validate_match_result(
        &self,
        bracket: &Bracket,
        result: &MatchResult,
    ) -> Result<(), ResultValidationError> {
        let (round_index, match_index) = bracket
            .locate_match(result.match_id)
            .ok_or(ResultValidationError::UnknownMatch(result.match_id))?;
        let round = &bracket.rounds[round_index];
        let game = &round.matches[match_index];

        if game.is_completed() {
            return Err(ResultValidationError::MatchAlreadyCompleted(game.id));
        }
        if round.status != RoundStatus::InProgress {
            return Err(ResultValidationError::RoundNotInProgress(round.number));
        }
        if !game.has_players(result.player1_id, result.player2_id) {
            return Err(ResultValidationError::PlayerMismatch(game.id));
        }
        if let Some(context) = bracket.active_matches.get(&game.id)
            && !context.has_players(result.player1_id, result.player2_id)
        {
            return Err(ResultValidationError::ActiveMatchMismatch(game.id));
        }
        if !result.involves(result.winner_id) {
            return Err(ResultValidationError::WinnerNotParticipant(result.winner_id));
        }

        if !result.forfeit && result.winner_score() < result.loser_score() {
            return Err(ResultValidationError::WinnerScoreBelowLoser {
                winner_score: result.winner_score(),
                loser_score: result.loser_score(),
            });
        }

        let stats = &result.statistics;
        let mut moves = [0u32; 2];
        for (slot, (player, cooperations, betrayals)) in moves.iter_mut().zip([
            (result.player1_id, stats.player1_cooperations, stats.player1_betrayals),
            (result.player2_id, stats.player2_cooperations, stats.player2_betrayals),
        ]) {
            *slot = cooperations
                .checked_add(betrayals)
                .filter(|total| *total <= self.max_moves_per_match)
                .ok_or(ResultValidationError::TooManyMoves {
                    player,
                    cooperations,
                    betrayals,
                    max: self.max_moves_per_match,
                })?;
        }
        let [player1_moves, player2_moves] = moves;
        if player1_moves != player2_moves {
            return Err(ResultValidationError::MoveCountMismatch {
                player1_moves,
                player2_moves,
            });
        }

        for (player, score) in [
            (result.player1_id, result.player1_score),
            (result.player2_id, result.player2_score),
        ] {
            let max = u64::from(self.max_points_per_move) * u64::from(player1_moves);
            if u64::from(score) > max {
                return Err(ResultValidationError::ScoreExceedsMoves { player, score, max });
            }
            if score > self.max_match_score {
                return Err(ResultValidationError::ScoreExceedsMaximum {
                    player,
                    score,
                    max: self.max_match_score,
                });
            }
        }

        Ok(())
    }
}

impl Default for IntegrityValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_POINTS_PER_MOVE,
            DEFAULT_MAX_MATCH_SCORE,
            DEFAULT_MAX_MOVES_PER_MATCH,
        )
    }
}
