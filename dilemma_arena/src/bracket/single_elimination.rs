//! Single elimination brackets.

use super::{
    BracketGenerator, BracketResult, BracketUpdate, elimination_rounds,
    models::{Bracket, Ladder, MatchResult, PlayerId, Round, RoundStatus, TournamentFormat, TournamentId},
    record_result,
};
use crate::security::SeedingPolicy;
use chrono::Utc;

/// Single elimination: a loss eliminates, winners meet again until one remains.
///
/// Players are shuffled before round 1. With an odd count the last player gets a
/// bye. There are `ceil(log2(n))` rounds; later rounds exist as empty
/// placeholders until the previous round completes.
#[derive(Debug, Clone, Default)]
pub struct SingleElimination {
    seeding: SeedingPolicy,
}

impl SingleElimination {
    pub fn new(seeding: SeedingPolicy) -> Self {
        Self { seeding }
    }
}

impl BracketGenerator for SingleElimination {
    fn format(&self) -> TournamentFormat {
        TournamentFormat::SingleElimination
    }

    fn total_rounds(&self, player_count: usize) -> u32 {
        elimination_rounds(player_count)
    }

    fn generate_bracket(&self, tournament_id: TournamentId, players: &[PlayerId]) -> Bracket {
        let seeded = self.seeding.apply(players);
        let mut rounds: Vec<Round> = (1..=self.total_rounds(seeded.len()))
            .map(|number| Round::new(number, Ladder::Winners, number))
            .collect();

        if let Some(first) = rounds.first_mut() {
            first.populate(tournament_id, &seeded);
        }

        Bracket::new(self.format(), tournament_id, seeded, rounds)
    }

    fn process_match_result(
        &self,
        result: &MatchResult,
        bracket: &Bracket,
    ) -> BracketResult<BracketUpdate> {
        let now = Utc::now();
        let mut bracket = bracket.clone();
        let recorded = record_result(&mut bracket, result, now)?;

        bracket.eliminated.insert(recorded.loser);
        let tournament_id = bracket.tournament_id;
        let mut update = BracketUpdate::new(bracket);
        update.eliminated_players.push(recorded.loser);

        let mut index = recorded.round_index;
        loop {
            let rounds = &mut update.bracket.rounds;
            if !rounds[index].all_matches_completed() {
                break;
            }
            rounds[index].complete(now);
            update.completed_rounds.push(rounds[index].number);

            let advancing = rounds[index].advancing_players();
            let Some(next) = rounds.get_mut(index + 1) else {
                break;
            };
            next.populate(tournament_id, &advancing);
            if !next.matches.is_empty() {
                update.ready_rounds.push(next.number);
                break;
            }
            // A lone survivor only has a bye; settle it right away.
            index += 1;
        }

        let is_complete = self.is_complete(&update.bracket);
        Ok(update.finish(is_complete))
    }

    fn is_complete(&self, bracket: &Bracket) -> bool {
        match bracket.rounds.last() {
            None => true,
            Some(last) => last.status == RoundStatus::Completed && last.matches.len() == 1,
        }
    }

    fn champion(&self, bracket: &Bracket) -> Option<PlayerId> {
        match bracket.rounds.last() {
            None => bracket.players.first().copied().filter(|_| bracket.players.len() == 1),
            Some(last) if self.is_complete(bracket) => last.matches[0].winner(),
            Some(_) => None,
        }
    }
}
