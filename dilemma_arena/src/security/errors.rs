//! Error types for security module

use crate::bracket::{MatchId, PlayerId};
use thiserror::Error;

/// Result type for anti-collusion operations
pub type AntiCollusionResult<T> = Result<T, AntiCollusionError>;

/// Anti-collusion detection errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AntiCollusionError {
    /// Flag not found
    #[error("Collusion flag not found: {0}")]
    FlagNotFound(u64),

    /// Flag was already reviewed
    #[error("Collusion flag already reviewed: {0}")]
    AlreadyReviewed(u64),

    /// Invalid flag type
    #[error("Invalid flag type: {0}")]
    InvalidFlagType(String),
}

/// Structural problems found in a bracket
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("Player {0} is seeded more than once")]
    DuplicatePlayer(PlayerId),

    #[error("Expected {expected} rounds, bracket has {actual}")]
    RoundCountMismatch { expected: u32, actual: u32 },

    #[error("Round at position {position} is numbered {number}")]
    RoundNumbering { position: u32, number: u32 },

    #[error("Match {match_id} in round {round} pits player {player} against themselves")]
    SelfPairing {
        match_id: MatchId,
        round: u32,
        player: PlayerId,
    },

    #[error("Player {player} appears more than once in round {round}")]
    PlayerRepeatedInRound { round: u32, player: PlayerId },

    #[error("Player {player} in round {round} is not part of the roster")]
    UnknownPlayer { round: u32, player: PlayerId },

    #[error("Eliminated player {player} is scheduled in round {round}")]
    EliminatedPlayerScheduled { round: u32, player: PlayerId },

    #[error("Player {0} is in more than one active match")]
    PlayerInMultipleMatches(PlayerId),
}

/// Reasons a submitted match result is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultValidationError {
    #[error("Unknown match: {0}")]
    UnknownMatch(MatchId),

    #[error("Match already completed: {0}")]
    MatchAlreadyCompleted(MatchId),

    #[error("Round {0} is not in progress")]
    RoundNotInProgress(u32),

    #[error("Result players do not match the pairing of match {0}")]
    PlayerMismatch(MatchId),

    #[error("Result does not match the active match context of {0}")]
    ActiveMatchMismatch(MatchId),

    #[error("Winner {0} did not play in the match")]
    WinnerNotParticipant(PlayerId),

    #[error("Winner scored {winner_score}, below loser score {loser_score}")]
    WinnerScoreBelowLoser { winner_score: u32, loser_score: u32 },

    #[error("Player {player} scored {score}, above the {max} possible in their moves")]
    ScoreExceedsMoves {
        player: PlayerId,
        score: u32,
        max: u64,
    },

    #[error(
        "Player {player} reported {cooperations} cooperations and {betrayals} betrayals, above the {max} moves allowed"
    )]
    TooManyMoves {
        player: PlayerId,
        cooperations: u32,
        betrayals: u32,
        max: u32,
    },

    #[error("Move counts differ: {player1_moves} vs {player2_moves}")]
    MoveCountMismatch {
        player1_moves: u32,
        player2_moves: u32,
    },

    #[error("Player {player} scored {score}, above the match maximum {max}")]
    ScoreExceedsMaximum {
        player: PlayerId,
        score: u32,
        max: u32,
    },

    #[error("No scheduled match pairs {player1} with {player2} in an armed round")]
    PairingNotScheduled { player1: PlayerId, player2: PlayerId },

    #[error("Player {0} is already in an active match")]
    PlayerAlreadyInMatch(PlayerId),
}
