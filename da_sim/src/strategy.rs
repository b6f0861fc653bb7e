//! Scripted strategies and iterated cooperate/betray match play.

use dilemma_arena::bracket::MatchStatistics;
use dilemma_arena::tournament::PlayerId;
use rand::Rng;
use std::fmt;

/// One move in a round of play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Cooperate,
    Betray,
}

/// Points for `(a, b)` given both moves
pub fn payoff(a: Move, b: Move) -> (u32, u32) {
    match (a, b) {
        (Move::Cooperate, Move::Cooperate) => (3, 3),
        (Move::Betray, Move::Cooperate) => (5, 0),
        (Move::Cooperate, Move::Betray) => (0, 5),
        (Move::Betray, Move::Betray) => (1, 1),
    }
}

/// Scripted bot behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    AlwaysCooperate,
    AlwaysBetray,
    /// Cooperates first, then copies the opponent's last move
    TitForTat,
    /// Coin flip every move
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::AlwaysCooperate,
        Strategy::AlwaysBetray,
        Strategy::TitForTat,
        Strategy::Random,
    ];

    /// Strategy assigned to a player, cycling through every kind
    pub fn for_player(player_id: PlayerId) -> Self {
        Self::ALL[player_id.rem_euclid(Self::ALL.len() as PlayerId) as usize]
    }

    pub fn next_move<R: Rng + ?Sized>(&self, opponent_history: &[Move], rng: &mut R) -> Move {
        match self {
            Strategy::AlwaysCooperate => Move::Cooperate,
            Strategy::AlwaysBetray => Move::Betray,
            Strategy::TitForTat => opponent_history.last().copied().unwrap_or(Move::Cooperate),
            Strategy::Random => {
                if rng.random_bool(0.5) {
                    Move::Cooperate
                } else {
                    Move::Betray
                }
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::AlwaysCooperate => write!(f, "always_cooperate"),
            Strategy::AlwaysBetray => write!(f, "always_betray"),
            Strategy::TitForTat => write!(f, "tit_for_tat"),
            Strategy::Random => write!(f, "random"),
        }
    }
}

/// Scores and move counts of a played match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub player1_score: u32,
    pub player2_score: u32,
    pub statistics: MatchStatistics,
}

impl MatchOutcome {
    /// Higher scorer wins; a tie goes to a coin flip
    pub fn player1_wins<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match self.player1_score.cmp(&self.player2_score) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => rng.random_bool(0.5),
        }
    }
}

/// Play `moves` simultaneous rounds between two strategies
pub fn play_match<R: Rng + ?Sized>(
    player1: Strategy,
    player2: Strategy,
    moves: u32,
    rng: &mut R,
) -> MatchOutcome {
    let started = std::time::Instant::now();
    let mut history1 = Vec::with_capacity(moves as usize);
    let mut history2 = Vec::with_capacity(moves as usize);
    let mut outcome = MatchOutcome {
        player1_score: 0,
        player2_score: 0,
        statistics: MatchStatistics::default(),
    };

    for _ in 0..moves {
        let move1 = player1.next_move(&history2, rng);
        let move2 = player2.next_move(&history1, rng);
        let (points1, points2) = payoff(move1, move2);
        outcome.player1_score += points1;
        outcome.player2_score += points2;

        let stats = &mut outcome.statistics;
        match move1 {
            Move::Cooperate => stats.player1_cooperations += 1,
            Move::Betray => stats.player1_betrayals += 1,
        }
        match move2 {
            Move::Cooperate => stats.player2_cooperations += 1,
            Move::Betray => stats.player2_betrayals += 1,
        }

        history1.push(move1);
        history2.push(move2);
    }

    outcome.statistics.duration_ms = started.elapsed().as_millis() as u64;
    outcome
}
