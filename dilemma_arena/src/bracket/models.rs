//! Bracket data models shared by every tournament format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::BracketError;

/// Player ID type
pub type PlayerId = i64;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentFormat::SingleElimination => write!(f, "single_elimination"),
            TournamentFormat::DoubleElimination => write!(f, "double_elimination"),
            TournamentFormat::RoundRobin => write!(f, "round_robin"),
        }
    }
}

impl FromStr for TournamentFormat {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single_elimination" => Ok(TournamentFormat::SingleElimination),
            "double_elimination" => Ok(TournamentFormat::DoubleElimination),
            "round_robin" => Ok(TournamentFormat::RoundRobin),
            _ => Err(BracketError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
}

/// Round status
///
/// Only ever advances `NotStarted -> InProgress -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Which ladder of the bracket a round belongs to.
///
/// Single elimination and round robin only use `Winners`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ladder {
    Winners,
    Losers,
    GrandFinals,
}

impl fmt::Display for Ladder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ladder::Winners => write!(f, "winners"),
            Ladder::Losers => write!(f, "losers"),
            Ladder::GrandFinals => write!(f, "grand_finals"),
        }
    }
}

/// Auxiliary statistics reported with a match result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStatistics {
    /// Times player 1 cooperated
    pub player1_cooperations: u32,
    /// Times player 1 betrayed
    pub player1_betrayals: u32,
    /// Times player 2 cooperated
    pub player2_cooperations: u32,
    /// Times player 2 betrayed
    pub player2_betrayals: u32,
    /// Wall-clock duration of the match in milliseconds
    pub duration_ms: u64,
}

/// Outcome of a single match, submitted once by the game-execution collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub winner_id: PlayerId,
    pub player1_score: u32,
    pub player2_score: u32,
    pub statistics: MatchStatistics,
    /// The loser forfeited; the result still counts as a normal win/loss
    #[serde(default)]
    pub forfeit: bool,
}

impl MatchResult {
    /// Loser of the match (the participant that is not the winner)
    pub fn loser_id(&self) -> PlayerId {
        if self.winner_id == self.player1_id {
            self.player2_id
        } else {
            self.player1_id
        }
    }

    /// Whether `player_id` took part in this match
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// Score of a participant
    pub fn score_for(&self, player_id: PlayerId) -> Option<u32> {
        if player_id == self.player1_id {
            Some(self.player1_score)
        } else if player_id == self.player2_id {
            Some(self.player2_score)
        } else {
            None
        }
    }

    /// Score of the opponent of `player_id`
    pub fn opponent_score(&self, player_id: PlayerId) -> Option<u32> {
        self.opponent_of(player_id)
            .and_then(|opponent| self.score_for(opponent))
    }

    /// The other participant
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if player_id == self.player1_id {
            Some(self.player2_id)
        } else if player_id == self.player2_id {
            Some(self.player1_id)
        } else {
            None
        }
    }

    /// `(cooperations, betrayals)` for a participant
    pub fn moves_for(&self, player_id: PlayerId) -> Option<(u32, u32)> {
        if player_id == self.player1_id {
            Some((
                self.statistics.player1_cooperations,
                self.statistics.player1_betrayals,
            ))
        } else if player_id == self.player2_id {
            Some((
                self.statistics.player2_cooperations,
                self.statistics.player2_betrayals,
            ))
        } else {
            None
        }
    }

    pub fn winner_score(&self) -> u32 {
        self.score_for(self.winner_id).unwrap_or(0)
    }

    pub fn loser_score(&self) -> u32 {
        self.score_for(self.loser_id()).unwrap_or(0)
    }

    /// Absolute difference between the two scores
    pub fn score_differential(&self) -> u32 {
        self.player1_score.abs_diff(self.player2_score)
    }

    /// Combined score of both players
    pub fn combined_score(&self) -> u64 {
        u64::from(self.player1_score) + u64::from(self.player2_score)
    }
}

/// A proposed, not yet materialized match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPairing {
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub round_number: u32,
}

impl MatchPairing {
    pub fn new(player1: PlayerId, player2: PlayerId, round_number: u32) -> Self {
        Self {
            player1,
            player2,
            round_number,
        }
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1 == player_id || self.player2 == player_id
    }

    /// Same two players, in either order
    pub fn has_players(&self, a: PlayerId, b: PlayerId) -> bool {
        (self.player1 == a && self.player2 == b) || (self.player1 == b && self.player2 == a)
    }
}

/// In-flight context for a match handed out for live play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMatch {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub round_number: u32,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub started_at: DateTime<Utc>,
}

impl ActiveMatch {
    pub fn has_players(&self, a: PlayerId, b: PlayerId) -> bool {
        (self.player1 == a && self.player2 == b) || (self.player1 == b && self.player2 == a)
    }
}

/// A single match between two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round_number: u32,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub status: MatchStatus,
    pub result: Option<MatchResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create a new scheduled match
    pub fn new(
        tournament_id: TournamentId,
        round_number: u32,
        player1: PlayerId,
        player2: PlayerId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            player1,
            player2,
            status: MatchStatus::Scheduled,
            result: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1 == player_id || self.player2 == player_id
    }

    /// Same two players, in either order
    pub fn has_players(&self, a: PlayerId, b: PlayerId) -> bool {
        (self.player1 == a && self.player2 == b) || (self.player1 == b && self.player2 == a)
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.result.as_ref().map(|r| r.winner_id)
    }

    pub fn loser(&self) -> Option<PlayerId> {
        self.result.as_ref().map(MatchResult::loser_id)
    }

    pub fn pairing(&self) -> MatchPairing {
        MatchPairing::new(self.player1, self.player2, self.round_number)
    }
}

/// One wave of matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Position in the bracket's combined round sequence (1-indexed)
    pub number: u32,
    pub ladder: Ladder,
    /// Position within its ladder (1-indexed)
    pub ladder_round: u32,
    pub matches: Vec<Match>,
    /// Players advancing from this round without playing
    pub byes: Vec<PlayerId>,
    pub status: RoundStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Create an empty round
    pub fn new(number: u32, ladder: Ladder, ladder_round: u32) -> Self {
        Self {
            number,
            ladder,
            ladder_round,
            matches: Vec::new(),
            byes: Vec::new(),
            status: RoundStatus::NotStarted,
            started_at: None,
            completed_at: None,
        }
    }

    /// Pair entrants sequentially; an odd entrant out receives a bye
    pub fn populate(&mut self, tournament_id: TournamentId, entrants: &[PlayerId]) {
        let mut chunks = entrants.chunks_exact(2);
        for pair in chunks.by_ref() {
            self.matches
                .push(Match::new(tournament_id, self.number, pair[0], pair[1]));
        }
        self.byes.extend_from_slice(chunks.remainder());
    }

    /// Whether entrants have been assigned to this round
    pub fn is_populated(&self) -> bool {
        !self.matches.is_empty() || !self.byes.is_empty() || self.status == RoundStatus::Completed
    }

    /// A round is complete iff it is populated and every match in it is completed
    pub fn all_matches_completed(&self) -> bool {
        self.is_populated() && self.matches.iter().all(Match::is_completed)
    }

    /// Match winners in match order, followed by bye recipients
    pub fn advancing_players(&self) -> Vec<PlayerId> {
        self.matches
            .iter()
            .filter_map(Match::winner)
            .chain(self.byes.iter().copied())
            .collect()
    }

    /// Match losers in match order
    pub fn losers(&self) -> Vec<PlayerId> {
        self.matches.iter().filter_map(Match::loser).collect()
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.byes.contains(&player_id) || self.matches.iter().any(|m| m.involves(player_id))
    }

    /// Mark the round in progress. Returns false if it was already armed or finished.
    pub fn arm(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != RoundStatus::NotStarted {
            return false;
        }
        self.status = RoundStatus::InProgress;
        self.started_at = Some(now);
        true
    }

    /// Mark the round completed
    pub fn complete(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.status = RoundStatus::Completed;
        self.completed_at = Some(now);
    }

    pub fn pairings(&self) -> Vec<MatchPairing> {
        self.matches.iter().map(Match::pairing).collect()
    }
}

/// Full structure and progress of one tournament's matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub format: TournamentFormat,
    pub tournament_id: TournamentId,
    /// Players in seeded order
    pub players: Vec<PlayerId>,
    pub rounds: Vec<Round>,
    pub eliminated: BTreeSet<PlayerId>,
    pub active_matches: HashMap<MatchId, ActiveMatch>,
    /// Losses per player, used by the double elimination second-loss rule
    pub losses: HashMap<PlayerId, u32>,
}

impl Bracket {
    pub fn new(
        format: TournamentFormat,
        tournament_id: TournamentId,
        players: Vec<PlayerId>,
        rounds: Vec<Round>,
    ) -> Self {
        Self {
            format,
            tournament_id,
            players,
            rounds,
            eliminated: BTreeSet::new(),
            active_matches: HashMap::new(),
            losses: HashMap::new(),
        }
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.number == number)
    }

    pub fn round_mut(&mut self, number: u32) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.number == number)
    }

    /// `(round index, match index)` of a match
    pub fn locate_match(&self, match_id: MatchId) -> Option<(usize, usize)> {
        self.rounds.iter().enumerate().find_map(|(ri, round)| {
            round
                .matches
                .iter()
                .position(|m| m.id == match_id)
                .map(|mi| (ri, mi))
        })
    }

    pub fn find_match(&self, match_id: MatchId) -> Option<&Match> {
        self.locate_match(match_id)
            .map(|(ri, mi)| &self.rounds[ri].matches[mi])
    }

    /// Every match in round order
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|r| r.matches.iter())
    }

    pub fn total_matches(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }

    pub fn completed_matches(&self) -> usize {
        self.matches().filter(|m| m.is_completed()).count()
    }

    pub fn completed_rounds(&self) -> u32 {
        self.rounds
            .iter()
            .filter(|r| r.status == RoundStatus::Completed)
            .count() as u32
    }

    pub fn is_eliminated(&self, player_id: PlayerId) -> bool {
        self.eliminated.contains(&player_id)
    }

    pub fn losses_for(&self, player_id: PlayerId) -> u32 {
        self.losses.get(&player_id).copied().unwrap_or(0)
    }

    /// Whether the player is currently in an active match
    pub fn is_player_active(&self, player_id: PlayerId) -> bool {
        self.active_matches
            .values()
            .any(|a| a.player1 == player_id || a.player2 == player_id)
    }

    /// Arm a populated round. Returns false if the round is missing or was not `NotStarted`.
    pub fn arm_round(&mut self, number: u32, now: DateTime<Utc>) -> bool {
        self.round_mut(number).is_some_and(|r| r.arm(now))
    }

    /// Pairings of every scheduled match in an armed round, in round then match order
    pub fn ready_pairings(&self) -> Vec<MatchPairing> {
        self.rounds
            .iter()
            .filter(|r| r.status == RoundStatus::InProgress)
            .flat_map(|r| r.matches.iter())
            .filter(|m| m.status == MatchStatus::Scheduled)
            .map(Match::pairing)
            .collect()
    }

    /// Pairings of the given rounds
    pub fn pairings_for_rounds(&self, numbers: &[u32]) -> Vec<MatchPairing> {
        numbers
            .iter()
            .filter_map(|n| self.round(*n))
            .flat_map(Round::pairings)
            .collect()
    }

    /// Rounds in a given ladder, in ladder order
    pub fn ladder_rounds(&self, ladder: Ladder) -> impl Iterator<Item = &Round> {
        self.rounds.iter().filter(move |r| r.ladder == ladder)
    }

    pub fn ladder_round(&self, ladder: Ladder, ladder_round: u32) -> Option<&Round> {
        self.rounds
            .iter()
            .find(|r| r.ladder == ladder && r.ladder_round == ladder_round)
    }
}
