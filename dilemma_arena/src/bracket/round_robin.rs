//! Round robin schedules.

use super::{
    BracketGenerator, BracketResult, BracketUpdate,
    models::{Bracket, Ladder, Match, MatchResult, PlayerId, Round, RoundStatus, TournamentFormat, TournamentId},
    record_result,
};
use chrono::Utc;

/// Round robin: every player meets every other player exactly once.
///
/// The schedule is built up front with the circle method. With an odd player
/// count a bye seat is added and whoever draws it sits the round out. Nobody
/// is eliminated; final placement comes from the standings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }

    /// Circle-method rotation: seat 0 stays fixed, the others rotate one step per round
    fn schedule(players: &[PlayerId]) -> Vec<Vec<(Option<PlayerId>, Option<PlayerId>)>> {
        let mut seats: Vec<Option<PlayerId>> = players.iter().copied().map(Some).collect();
        if seats.len() % 2 == 1 {
            seats.push(None);
        }

        let size = seats.len();
        let mut rounds = Vec::with_capacity(size.saturating_sub(1));
        for _ in 1..size {
            rounds.push((0..size / 2).map(|i| (seats[i], seats[size - 1 - i])).collect());
            seats[1..].rotate_right(1);
        }
        rounds
    }
}

impl BracketGenerator for RoundRobin {
    fn format(&self) -> TournamentFormat {
        TournamentFormat::RoundRobin
    }

    fn total_rounds(&self, player_count: usize) -> u32 {
        match player_count {
            0 | 1 => 0,
            n if n % 2 == 0 => (n - 1) as u32,
            n => n as u32,
        }
    }

    fn generate_bracket(&self, tournament_id: TournamentId, players: &[PlayerId]) -> Bracket {
        let players = players.to_vec();
        let rounds = if players.len() < 2 {
            Vec::new()
        } else {
            Self::schedule(&players)
                .into_iter()
                .zip(1u32..)
                .map(|(seating, number)| {
                    let mut round = Round::new(number, Ladder::Winners, number);
                    for pair in seating {
                        match pair {
                            (Some(a), Some(b)) => {
                                round.matches.push(Match::new(tournament_id, number, a, b))
                            }
                            (Some(p), None) | (None, Some(p)) => round.byes.push(p),
                            (None, None) => {}
                        }
                    }
                    round
                })
                .collect()
        };

        Bracket::new(self.format(), tournament_id, players, rounds)
    }

    fn process_match_result(
        &self,
        result: &MatchResult,
        bracket: &Bracket,
    ) -> BracketResult<BracketUpdate> {
        let now = Utc::now();
        let mut bracket = bracket.clone();
        let recorded = record_result(&mut bracket, result, now)?;
        let mut update = BracketUpdate::new(bracket);

        let rounds = &mut update.bracket.rounds;
        if rounds[recorded.round_index].all_matches_completed() {
            rounds[recorded.round_index].complete(now);
            update.completed_rounds.push(rounds[recorded.round_index].number);

            if let Some(next) = rounds.get(recorded.round_index + 1)
                && next.status == RoundStatus::NotStarted
            {
                update.ready_rounds.push(next.number);
            }
        }

        let is_complete = self.is_complete(&update.bracket);
        Ok(update.finish(is_complete))
    }

    fn is_complete(&self, bracket: &Bracket) -> bool {
        bracket
            .rounds
            .iter()
            .all(|r| r.status == RoundStatus::Completed)
    }
}
