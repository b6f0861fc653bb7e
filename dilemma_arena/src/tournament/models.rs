//! Tournament data models.

use crate::bracket::{Bracket, MatchPairing, MatchResult};
use crate::security::SeedingPolicy;
use crate::stats::{PlayerStatistics, RankingEntry, TournamentSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::bracket::{PlayerId, TournamentFormat, TournamentId};

/// Lobby ID type
pub type LobbyId = Uuid;

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Created, waiting for start
    NotStarted,
    /// Matches are being played
    InProgress,
    /// Bracket finished, rankings final
    Completed,
}

impl std::fmt::Display for TournamentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentState::NotStarted => write!(f, "not_started"),
            TournamentState::InProgress => write!(f, "in_progress"),
            TournamentState::Completed => write!(f, "completed"),
        }
    }
}

/// Player lifecycle status within a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Waiting,
    Ready,
    InMatch,
    Eliminated,
}

/// Roster state reported by the lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterState {
    /// Still accepting players
    Forming,
    /// Full and confirmed
    ReadyToStart,
    /// Abandoned by the lobby
    Disbanded,
}

/// One registered player as handed over by the lobby
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub name: String,
}

impl RosterEntry {
    pub fn new(player_id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
        }
    }
}

/// Tournament creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRequest {
    pub lobby_id: LobbyId,
    pub players: Vec<RosterEntry>,
    pub format: TournamentFormat,
    pub roster_state: RosterState,
    /// Ordering of elimination brackets, shuffled unless told otherwise
    #[serde(default)]
    pub seeding: SeedingPolicy,
}

impl TournamentRequest {
    /// Request for a confirmed roster with shuffled seeding
    pub fn new(lobby_id: LobbyId, players: Vec<RosterEntry>, format: TournamentFormat) -> Self {
        Self {
            lobby_id,
            players,
            format,
            roster_state: RosterState::ReadyToStart,
            seeding: SeedingPolicy::default(),
        }
    }

    pub fn with_seeding(mut self, seeding: SeedingPolicy) -> Self {
        self.seeding = seeding;
        self
    }
}

/// A tournament participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub eliminated: bool,
    /// Current standing, 1-based
    pub rank: u32,
    pub statistics: PlayerStatistics,
    pub status: PlayerStatus,
}

impl Player {
    pub fn new(id: PlayerId, name: String, rank: u32) -> Self {
        Self {
            id,
            name,
            eliminated: false,
            rank,
            statistics: PlayerStatistics::default(),
            status: PlayerStatus::Waiting,
        }
    }

    /// Flag as eliminated; status follows
    pub fn eliminate(&mut self) {
        self.eliminated = true;
        self.status = PlayerStatus::Eliminated;
    }
}

/// A tournament and everything it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub lobby_id: LobbyId,
    pub format: TournamentFormat,
    pub players: Vec<Player>,
    pub bracket: Bracket,
    /// 1-based, never beyond `total_rounds`
    pub current_round: u32,
    pub total_rounds: u32,
    pub state: TournamentState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Bracket champion for elimination formats, rank 1 for round robin
    pub winner: Option<PlayerId>,
    /// Filled in on completion.
    ///
    /// Ordered by tournament points, so in elimination formats rank 1 can
    /// differ from `winner`.
    pub final_rankings: Vec<RankingEntry>,
    pub summary: Option<TournamentSummary>,
}

impl Tournament {
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn is_participant(&self, player_id: PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    /// Players still in contention
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.eliminated)
    }

    pub fn is_completed(&self) -> bool {
        self.state == TournamentState::Completed
    }

    pub fn info(&self) -> TournamentInfo {
        TournamentInfo {
            id: self.id,
            lobby_id: self.lobby_id,
            format: self.format,
            state: self.state,
            player_count: self.players.len(),
            remaining_players: self.active_players().count(),
            current_round: self.current_round,
            total_rounds: self.total_rounds,
            completed_matches: self.bracket.completed_matches(),
            total_matches: self.bracket.total_matches(),
            winner: self.winner,
            created_at: self.created_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

/// Tournament information for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub id: TournamentId,
    pub lobby_id: LobbyId,
    pub format: TournamentFormat,
    pub state: TournamentState,
    pub player_count: usize,
    pub remaining_players: usize,
    pub current_round: u32,
    pub total_rounds: u32,
    pub completed_matches: usize,
    /// Matches materialized so far; elimination formats add rounds as they go
    pub total_matches: usize,
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Event describing what a lifecycle operation changed.
///
/// Every variant carries a snapshot of the tournament after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentUpdate {
    /// The tournament started and its first round is armed
    TournamentStarted {
        tournament: Box<Tournament>,
        next_matches: Vec<MatchPairing>,
    },

    /// A result completed at least one round
    RoundAdvanced {
        tournament: Box<Tournament>,
        result: MatchResult,
        completed_rounds: Vec<u32>,
        eliminated_players: Vec<PlayerId>,
        next_matches: Vec<MatchPairing>,
    },

    /// A result was recorded without completing a round
    MatchResult {
        tournament: Box<Tournament>,
        result: MatchResult,
        eliminated_players: Vec<PlayerId>,
    },

    /// The last result finished the tournament
    TournamentCompleted {
        tournament: Box<Tournament>,
        result: MatchResult,
        winner: Option<PlayerId>,
        rankings: Vec<RankingEntry>,
    },
}

impl TournamentUpdate {
    pub fn tournament(&self) -> &Tournament {
        match self {
            TournamentUpdate::TournamentStarted { tournament, .. }
            | TournamentUpdate::RoundAdvanced { tournament, .. }
            | TournamentUpdate::MatchResult { tournament, .. }
            | TournamentUpdate::TournamentCompleted { tournament, .. } => tournament,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TournamentUpdate::TournamentStarted { .. } => "tournament_started",
            TournamentUpdate::RoundAdvanced { .. } => "round_advanced",
            TournamentUpdate::MatchResult { .. } => "match_result",
            TournamentUpdate::TournamentCompleted { .. } => "tournament_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_eliminate() {
        let mut player = Player::new(7, "seven".to_string(), 1);
        assert_eq!(player.status, PlayerStatus::Waiting);
        player.eliminate();
        assert!(player.eliminated);
        assert_eq!(player.status, PlayerStatus::Eliminated);
    }

    #[test]
    fn test_request_defaults() {
        let request = TournamentRequest::new(
            Uuid::new_v4(),
            vec![RosterEntry::new(1, "a")],
            TournamentFormat::RoundRobin,
        );
        assert_eq!(request.roster_state, RosterState::ReadyToStart);
        assert_eq!(request.seeding, SeedingPolicy::Shuffled);
    }

    #[test]
    fn test_request_deserializes_without_seeding() {
        let json = serde_json::json!({
            "lobby_id": Uuid::new_v4(),
            "players": [{"player_id": 1, "name": "a"}],
            "format": "double_elimination",
            "roster_state": "ready_to_start"
        });
        let request: TournamentRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.format, TournamentFormat::DoubleElimination);
        assert_eq!(request.seeding, SeedingPolicy::Shuffled);
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&TournamentState::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&PlayerStatus::InMatch).unwrap(),
            "\"in_match\""
        );
    }
}
