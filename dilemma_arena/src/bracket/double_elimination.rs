//! Double elimination brackets.
//!
//! Rounds are laid out as `W = ceil(log2(n))` winners-ladder rounds, then
//! `L = 2W - 2` losers-ladder rounds, then one grand-finals round.
//!
//! ## Drop-down seeding
//!
//! - Losers round 1 takes the losers of winners round 1 in match order.
//! - Losers round `2k` takes the survivors of losers round `2k - 1` and the
//!   losers of winners round `k + 1`. The drop-downs are reversed and
//!   interleaved with the survivors (`s0, dN, s1, dN-1, ...`), leftovers last.
//! - Losers round `2k + 1` takes only the survivors of losers round `2k`.
//!
//! Entrants are paired sequentially and an odd one out gets a bye. A round
//! is populated as soon as every round feeding it is completed.

use super::{
    BracketGenerator, BracketResult, BracketUpdate, elimination_rounds,
    models::{Bracket, Ladder, MatchResult, PlayerId, Round, RoundStatus, TournamentFormat, TournamentId},
    record_result,
};
use crate::security::SeedingPolicy;
use chrono::Utc;

/// Losses after which a player is out
const ELIMINATION_LOSSES: u32 = 2;

/// Double elimination: a player is out after their second loss.
#[derive(Debug, Clone, Default)]
pub struct DoubleElimination {
    seeding: SeedingPolicy,
}

impl DoubleElimination {
    pub fn new(seeding: SeedingPolicy) -> Self {
        Self { seeding }
    }

    /// `(winners rounds, losers rounds)` for a player count
    pub fn ladder_sizes(player_count: usize) -> (u32, u32) {
        let winners = elimination_rounds(player_count);
        (winners, (2 * winners).saturating_sub(2))
    }

    /// Entrants of an unpopulated round, once all of its feeder rounds are done
    fn entrants_for(&self, bracket: &Bracket, round: &Round) -> Option<Vec<PlayerId>> {
        let (winners_rounds, losers_rounds) = Self::ladder_sizes(bracket.players.len());
        let completed = move |ladder: Ladder, number: u32| {
            bracket
                .ladder_round(ladder, number)
                .filter(|r| r.status == RoundStatus::Completed)
        };

        match round.ladder {
            Ladder::Winners => {
                let previous = completed(Ladder::Winners, round.ladder_round.checked_sub(1)?)?;
                Some(previous.advancing_players())
            }
            Ladder::Losers if round.ladder_round == 1 => {
                Some(completed(Ladder::Winners, 1)?.losers())
            }
            Ladder::Losers if round.ladder_round % 2 == 0 => {
                let survivors = completed(Ladder::Losers, round.ladder_round - 1)?;
                let drop_downs = completed(Ladder::Winners, round.ladder_round / 2 + 1)?;
                Some(seed_drop_downs(
                    &survivors.advancing_players(),
                    &drop_downs.losers(),
                ))
            }
            Ladder::Losers => {
                Some(completed(Ladder::Losers, round.ladder_round - 1)?.advancing_players())
            }
            Ladder::GrandFinals => {
                let winners_final = completed(Ladder::Winners, winners_rounds)?;
                let champion = *winners_final.advancing_players().first()?;
                let challenger = if losers_rounds == 0 {
                    *winners_final.losers().first()?
                } else {
                    *completed(Ladder::Losers, losers_rounds)?
                        .advancing_players()
                        .first()?
                };
                Some(vec![champion, challenger])
            }
        }
    }
}

/// Interleave losers-ladder survivors with reversed winners-ladder drop-downs
pub fn seed_drop_downs(survivors: &[PlayerId], drop_downs: &[PlayerId]) -> Vec<PlayerId> {
    let mut seeded = Vec::with_capacity(survivors.len() + drop_downs.len());
    let mut survivors = survivors.iter().copied();
    let mut drop_downs = drop_downs.iter().rev().copied();
    loop {
        match (survivors.next(), drop_downs.next()) {
            (None, None) => break,
            (survivor, drop_down) => {
                seeded.extend(survivor);
                seeded.extend(drop_down);
            }
        }
    }
    seeded
}

impl BracketGenerator for DoubleElimination {
    fn format(&self) -> TournamentFormat {
        TournamentFormat::DoubleElimination
    }

    fn total_rounds(&self, player_count: usize) -> u32 {
        match Self::ladder_sizes(player_count) {
            (0, _) => 0,
            (winners, losers) => winners + losers + 1,
        }
    }

    fn generate_bracket(&self, tournament_id: TournamentId, players: &[PlayerId]) -> Bracket {
        let seeded = self.seeding.apply(players);
        let (winners, losers) = Self::ladder_sizes(seeded.len());

        let mut rounds = Vec::with_capacity(self.total_rounds(seeded.len()) as usize);
        if winners > 0 {
            rounds.extend((1..=winners).map(|k| Round::new(k, Ladder::Winners, k)));
            rounds.extend((1..=losers).map(|j| Round::new(winners + j, Ladder::Losers, j)));
            rounds.push(Round::new(winners + losers + 1, Ladder::GrandFinals, 1));
            rounds[0].populate(tournament_id, &seeded);
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

        let loser_out = bracket.losses_for(recorded.loser) >= ELIMINATION_LOSSES;
        if loser_out {
            bracket.eliminated.insert(recorded.loser);
        }

        let tournament_id = bracket.tournament_id;
        let mut update = BracketUpdate::new(bracket);
        if loser_out {
            update.eliminated_players.push(recorded.loser);
        }

        let round = &mut update.bracket.rounds[recorded.round_index];
        if round.all_matches_completed() {
            round.complete(now);
            update.completed_rounds.push(round.number);
        }

        // Populate every round whose feeders are now done. Bye-only rounds
        // settle immediately and may unlock further rounds.
        loop {
            let pending = update
                .bracket
                .rounds
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.is_populated())
                .find_map(|(i, r)| self.entrants_for(&update.bracket, r).map(|e| (i, e)));

            let Some((index, entrants)) = pending else {
                break;
            };

            let round = &mut update.bracket.rounds[index];
            round.populate(tournament_id, &entrants);
            if round.matches.is_empty() {
                round.complete(now);
                update.completed_rounds.push(round.number);
            } else {
                update.ready_rounds.push(round.number);
            }
        }

        let is_complete = self.is_complete(&update.bracket);
        Ok(update.finish(is_complete))
    }

    fn is_complete(&self, bracket: &Bracket) -> bool {
        match bracket.rounds.last() {
            None => true,
            Some(finals) => finals.status == RoundStatus::Completed && finals.matches.len() == 1,
        }
    }

    fn champion(&self, bracket: &Bracket) -> Option<PlayerId> {
        match bracket.rounds.last() {
            None => bracket.players.first().copied().filter(|_| bracket.players.len() == 1),
            Some(finals) if self.is_complete(bracket) => finals.matches[0].winner(),
            Some(_) => None,
        }
    }
}
