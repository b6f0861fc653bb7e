//! Tournament error types.

use crate::bracket::{BracketError, PlayerId, TournamentId};
use crate::security::{IntegrityError, ResultValidationError};
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Insufficient players: need {needed}, have {current}")]
    InsufficientPlayers { needed: usize, current: usize },

    #[error("Too many players: at most {max}, have {current}")]
    TooManyPlayers { max: usize, current: usize },

    #[error("Player {0} is listed more than once")]
    DuplicatePlayer(PlayerId),

    #[error("Roster is not ready to start")]
    RosterNotReady,

    #[error("Tournament already started")]
    AlreadyStarted,

    #[error("Tournament has not started")]
    TournamentNotStarted,

    #[error("Tournament already completed")]
    TournamentAlreadyCompleted,

    #[error("Tournament is not completed")]
    TournamentNotCompleted,

    #[error("Player {0} is not in this tournament")]
    PlayerNotInTournament(PlayerId),

    #[error("Unsupported tournament format: {0}")]
    UnsupportedFormat(String),

    #[error("Bracket integrity check failed: {0}")]
    IntegrityValidationFailed(#[from] IntegrityError),

    #[error("Match result rejected: {0}")]
    MatchResultValidationFailed(#[from] ResultValidationError),

    #[error("Bracket error: {0}")]
    Bracket(BracketError),

    #[error("Tournament actor is unavailable")]
    ActorUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<BracketError> for TournamentError {
    fn from(err: BracketError) -> Self {
        match err {
            BracketError::UnsupportedFormat(format) => TournamentError::UnsupportedFormat(format),
            other => TournamentError::Bracket(other),
        }
    }
}

impl TournamentError {
    /// Get a client-safe error message
    ///
    /// Player and tournament ids are redacted and validation details are
    /// summarized, so callers can relay the text to untrusted clients.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::TournamentNotFound(_) => "Tournament not found".to_string(),
            TournamentError::DuplicatePlayer(_) => "Duplicate player in roster".to_string(),
            TournamentError::PlayerNotInTournament(_) => {
                "Player is not in this tournament".to_string()
            }
            TournamentError::IntegrityValidationFailed(_) => {
                "Tournament bracket failed validation".to_string()
            }
            TournamentError::MatchResultValidationFailed(_) | TournamentError::Bracket(_) => {
                "Match result rejected".to_string()
            }
            TournamentError::ActorUnavailable => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_unsupported_format_maps_from_bracket_error() {
        let err: TournamentError = BracketError::UnsupportedFormat("swiss".to_string()).into();
        assert_eq!(err, TournamentError::UnsupportedFormat("swiss".to_string()));

        let id = Uuid::new_v4();
        let err: TournamentError = BracketError::MatchNotFound(id).into();
        assert_eq!(err, TournamentError::Bracket(BracketError::MatchNotFound(id)));
    }

    #[test]
    fn test_client_message_redacts_ids() {
        let id = Uuid::new_v4();
        let msg = TournamentError::TournamentNotFound(id).client_message();
        assert!(!msg.contains(&id.to_string()));

        let msg = TournamentError::MatchResultValidationFailed(
            ResultValidationError::WinnerNotParticipant(42),
        )
        .client_message();
        assert!(!msg.contains("42"));

        let msg = TournamentError::InsufficientPlayers {
            needed: 4,
            current: 2,
        }
        .client_message();
        assert!(msg.contains("need 4"));
    }
}
