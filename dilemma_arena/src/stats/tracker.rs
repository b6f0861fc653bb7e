//! Per-result statistics updates, standings points and ranking.

use super::models::{PlayerStatistics, RankingEntry, TournamentSummary};
use crate::bracket::{Bracket, MatchResult, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Standings points awarded for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub win_points: u32,
    pub loss_points: u32,
    /// Winner bonus when the differential reaches `dominant_margin`
    pub dominant_bonus: u32,
    pub dominant_margin: u32,
    /// Winner bonus when the differential reaches `clear_margin` only
    pub clear_bonus: u32,
    pub clear_margin: u32,
    /// Bonus for either player scoring at least `high_score_threshold`
    pub high_score_bonus: u32,
    pub high_score_threshold: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            win_points: 3,
            loss_points: 1,
            dominant_bonus: 2,
            dominant_margin: 10,
            clear_bonus: 1,
            clear_margin: 5,
            high_score_bonus: 1,
            high_score_threshold: 30,
        }
    }
}

impl ScoringRules {
    /// Standings points a participant earns from a result
    pub fn points_for(&self, result: &MatchResult, player_id: PlayerId) -> u32 {
        let Some(score) = result.score_for(player_id) else {
            return 0;
        };

        let mut points = if player_id == result.winner_id {
            let margin = result.score_differential();
            let bonus = if margin >= self.dominant_margin {
                self.dominant_bonus
            } else if margin >= self.clear_margin {
                self.clear_bonus
            } else {
                0
            };
            self.win_points + bonus
        } else {
            self.loss_points
        };

        if score >= self.high_score_threshold {
            points += self.high_score_bonus;
        }
        points
    }
}

/// A player's standing as seen by the ranking
#[derive(Debug, Clone, Copy)]
pub struct Standing<'a> {
    pub player_id: PlayerId,
    pub name: &'a str,
    pub eliminated: bool,
    pub stats: &'a PlayerStatistics,
}

/// Maintains player statistics and derives standings
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerStatisticsTracker {
    rules: ScoringRules,
}

impl PlayerStatisticsTracker {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Fold one result into a participant's statistics.
    ///
    /// Does nothing if `player_id` did not play in the match.
    pub fn record_result(
        &self,
        stats: &mut PlayerStatistics,
        player_id: PlayerId,
        result: &MatchResult,
    ) {
        let (Some(score), Some(opponent), Some((cooperations, betrayals))) = (
            result.score_for(player_id),
            result.opponent_of(player_id),
            result.moves_for(player_id),
        ) else {
            return;
        };
        let conceded = result.opponent_score(player_id).unwrap_or(0);
        let won = result.winner_id == player_id;

        stats.matches_played += 1;
        if won {
            stats.matches_won += 1;
        } else {
            stats.matches_lost += 1;
        }
        stats.total_points += u64::from(score);
        stats.average_score = stats.total_points as f64 / f64::from(stats.matches_played);

        stats.cooperations = stats.cooperations.saturating_add(u64::from(cooperations));
        stats.betrayals = stats.betrayals.saturating_add(u64::from(betrayals));
        let moves = stats.total_moves();
        if moves > 0 {
            stats.cooperation_rate = stats.cooperations as f64 / moves as f64;
            stats.betrayal_rate = stats.betrayals as f64 / moves as f64;
        }

        stats.tournament_points += self.rules.points_for(result, player_id);
        stats.total_duration_ms = stats
            .total_duration_ms
            .saturating_add(result.statistics.duration_ms);

        let record = stats.head_to_head.entry(opponent).or_default();
        record.matches_played += 1;
        if won {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
        record.points_scored += u64::from(score);
        record.points_conceded += u64::from(conceded);
    }

    /// Byes are credited but are not matches
    pub fn record_bye(&self, stats: &mut PlayerStatistics) {
        stats.byes_received += 1;
    }

    /// Ranking order: tournament points, win rate, average score, total points
    /// (all descending), then player id ascending.
    pub fn compare_standings(a: &Standing<'_>, b: &Standing<'_>) -> Ordering {
        b.stats
            .tournament_points
            .cmp(&a.stats.tournament_points)
            .then_with(|| b.stats.win_rate().total_cmp(&a.stats.win_rate()))
            .then_with(|| b.stats.average_score.total_cmp(&a.stats.average_score))
            .then_with(|| b.stats.total_points.cmp(&a.stats.total_points))
            .then_with(|| a.player_id.cmp(&b.player_id))
    }

    /// Sort standings and assign ranks 1..n
    pub fn rank_players(&self, mut standings: Vec<Standing<'_>>) -> Vec<RankingEntry> {
        standings.sort_by(Self::compare_standings);
        standings
            .into_iter()
            .zip(1u32..)
            .map(|(standing, rank)| RankingEntry {
                rank,
                player_id: standing.player_id,
                name: standing.name.to_string(),
                tournament_points: standing.stats.tournament_points,
                matches_won: standing.stats.matches_won,
                matches_lost: standing.stats.matches_lost,
                win_rate: standing.stats.win_rate(),
                average_score: standing.stats.average_score,
                total_points: standing.stats.total_points,
                eliminated: standing.eliminated,
            })
            .collect()
    }

    /// Aggregate figures over every completed match of a bracket
    pub fn summarize(
        &self,
        bracket: &Bracket,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> TournamentSummary {
        let mut summary = TournamentSummary {
            rounds_completed: bracket.completed_rounds(),
            byes: bracket.rounds.iter().map(|r| r.byes.len() as u32).sum(),
            ..TournamentSummary::default()
        };

        let mut cooperations = 0u64;
        let mut moves = 0u64;
        for result in bracket.matches().filter_map(|m| m.result.as_ref()) {
            summary.total_matches += 1;
            summary.total_points += result.combined_score();
            summary.total_duration_ms = summary
                .total_duration_ms
                .saturating_add(result.statistics.duration_ms);
            if result.forfeit {
                summary.forfeits += 1;
            }
            if summary.highest_scoring_match.is_none()
                || result.combined_score() > summary.highest_match_score
            {
                summary.highest_scoring_match = Some(result.match_id);
                summary.highest_match_score = result.combined_score();
            }

            let stats = &result.statistics;
            let counts = [
                stats.player1_cooperations,
                stats.player1_betrayals,
                stats.player2_cooperations,
                stats.player2_betrayals,
            ]
            .map(u64::from);
            cooperations += counts[0] + counts[2];
            moves += counts.iter().sum::<u64>();
        }

        if summary.total_matches > 0 {
            let matches = f64::from(summary.total_matches);
            summary.average_match_score = summary.total_points as f64 / matches;
            summary.average_duration_ms = summary.total_duration_ms as f64 / matches;
        }
        if moves > 0 {
            summary.cooperation_rate = cooperations as f64 / moves as f64;
        }
        if let (Some(start), Some(end)) = (started_at, ended_at) {
            summary.tournament_duration_ms = Some((end - start).num_milliseconds());
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketGenerator, Generator, MatchStatistics, TournamentFormat};
    use crate::security::SeedingPolicy;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn result(winner: PlayerId, loser: PlayerId, winner_score: u32, loser_score: u32) -> MatchResult {
        MatchResult {
            match_id: Uuid::new_v4(),
            player1_id: winner,
            player2_id: loser,
            winner_id: winner,
            player1_score: winner_score,
            player2_score: loser_score,
            statistics: MatchStatistics {
                player1_cooperations: 8,
                player1_betrayals: 2,
                player2_cooperations: 2,
                player2_betrayals: 8,
                duration_ms: 2_000,
            },
            forfeit: false,
        }
    }

    #[test]
    fn test_points_for() {
        let rules = ScoringRules::default();
        // 30-20: win + dominant bonus + high score bonus
        assert_eq!(rules.points_for(&result(1, 2, 30, 20), 1), 6);
        assert_eq!(rules.points_for(&result(1, 2, 30, 20), 2), 1);
        // 25-18: win + clear bonus
        assert_eq!(rules.points_for(&result(1, 2, 25, 18), 1), 4);
        // 22-20: win only
        assert_eq!(rules.points_for(&result(1, 2, 22, 20), 1), 3);
        // 33-31: win + high score; loser also crosses the threshold
        assert_eq!(rules.points_for(&result(1, 2, 33, 31), 1), 4);
        assert_eq!(rules.points_for(&result(1, 2, 33, 31), 2), 2);
        // outsiders earn nothing
        assert_eq!(rules.points_for(&result(1, 2, 30, 20), 3), 0);
    }

    #[test]
    fn test_record_result_updates_both_views() {
        let tracker = PlayerStatisticsTracker::default();
        let r = result(1, 2, 30, 20);
        let mut winner = PlayerStatistics::default();
        let mut loser = PlayerStatistics::default();

        tracker.record_result(&mut winner, 1, &r);
        tracker.record_result(&mut loser, 2, &r);

        assert_eq!(winner.matches_played, 1);
        assert_eq!(winner.matches_won, 1);
        assert_eq!(winner.total_points, 30);
        assert_eq!(winner.average_score, 30.0);
        assert_eq!(winner.cooperation_rate, 0.8);
        assert_eq!(winner.tournament_points, 6);
        assert_eq!(winner.total_duration_ms, 2_000);

        assert_eq!(loser.matches_lost, 1);
        assert_eq!(loser.betrayal_rate, 0.8);
        assert_eq!(loser.tournament_points, 1);

        let h2h = winner.against(2).unwrap();
        assert_eq!(h2h.wins, 1);
        assert_eq!(h2h.points_scored, 30);
        assert_eq!(h2h.points_conceded, 20);
        assert_eq!(loser.against(1).unwrap().losses, 1);
    }

    #[test]
    fn test_rates_weighted_by_moves() {
        let tracker = PlayerStatisticsTracker::default();
        let mut stats = PlayerStatistics::default();

        let mut short = result(1, 2, 10, 5);
        short.statistics.player1_cooperations = 2;
        short.statistics.player1_betrayals = 0;
        let mut long = result(1, 2, 30, 20);
        long.statistics.player1_cooperations = 0;
        long.statistics.player1_betrayals = 8;

        tracker.record_result(&mut stats, 1, &short);
        tracker.record_result(&mut stats, 1, &long);
        assert_eq!(stats.cooperation_rate, 0.2);
        assert_eq!(stats.betrayal_rate, 0.8);
    }

    #[test]
    fn test_large_move_counts_accumulate_without_overflow() {
        let tracker = PlayerStatisticsTracker::default();
        let mut stats = PlayerStatistics::default();
        let mut big = result(1, 2, 30, 20);
        big.statistics.player1_cooperations = 3_000_000_000;
        big.statistics.player1_betrayals = 0;
        big.statistics.duration_ms = u64::MAX;

        tracker.record_result(&mut stats, 1, &big);
        tracker.record_result(&mut stats, 1, &big);
        assert_eq!(stats.cooperations, 6_000_000_000);
        assert_eq!(stats.cooperation_rate, 1.0);
        assert_eq!(stats.total_duration_ms, u64::MAX);
    }

    #[test]
    fn test_outsider_result_ignored() {
        let tracker = PlayerStatisticsTracker::default();
        let mut stats = PlayerStatistics::default();
        tracker.record_result(&mut stats, 5, &result(1, 2, 30, 20));
        assert_eq!(stats, PlayerStatistics::default());
    }

    #[test]
    fn test_rank_order_and_tiebreaks() {
        let tracker = PlayerStatisticsTracker::default();
        let top = PlayerStatistics {
            tournament_points: 9,
            ..Default::default()
        };
        let better_rate = PlayerStatistics {
            tournament_points: 4,
            matches_played: 2,
            matches_won: 1,
            ..Default::default()
        };
        let worse_rate = PlayerStatistics {
            tournament_points: 4,
            matches_played: 2,
            matches_won: 0,
            average_score: 99.0,
            ..Default::default()
        };
        let tied = PlayerStatistics::default();

        let ranking = tracker.rank_players(vec![
            Standing { player_id: 8, name: "h", eliminated: true, stats: &tied },
            Standing { player_id: 4, name: "d", eliminated: false, stats: &worse_rate },
            Standing { player_id: 3, name: "c", eliminated: true, stats: &tied },
            Standing { player_id: 2, name: "b", eliminated: false, stats: &better_rate },
            Standing { player_id: 1, name: "a", eliminated: false, stats: &top },
        ]);

        let order: Vec<PlayerId> = ranking.iter().map(|e| e.player_id).collect();
        assert_eq!(order, vec![1, 2, 4, 3, 8]);
        let ranks: Vec<u32> = ranking.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(ranking[0].name, "a");
        assert!(ranking[4].eliminated);
    }

    #[test]
    fn test_summarize_played_bracket() {
        let tracker = PlayerStatisticsTracker::default();
        let generator =
            Generator::with_seeding(TournamentFormat::SingleElimination, SeedingPolicy::RosterOrder);
        let tid = Uuid::new_v4();
        let mut bracket = generator.generate_bracket(tid, &[1, 2, 3, 4, 5]);

        while !generator.is_complete(&bracket) {
            let open = bracket.matches().find(|m| !m.is_completed()).cloned().unwrap();
            let mut r = result(open.player1, open.player2, 30, 10);
            r.match_id = open.id;
            bracket = generator.process_match_result(&r, &bracket).unwrap().bracket;
        }

        let start = Utc::now();
        let end = start + chrono::Duration::milliseconds(1_500);
        let summary = tracker.summarize(&bracket, Some(start), Some(end));

        assert_eq!(summary.total_matches, 4);
        assert_eq!(summary.rounds_completed, 3);
        assert_eq!(summary.total_points, 160);
        assert_eq!(summary.average_match_score, 40.0);
        assert_eq!(summary.cooperation_rate, 0.5);
        assert_eq!(summary.total_duration_ms, 8_000);
        assert_eq!(summary.highest_match_score, 40);
        assert!(summary.highest_scoring_match.is_some());
        assert_eq!(summary.byes, 2);
        assert_eq!(summary.tournament_duration_ms, Some(1_500));
    }

    proptest! {
        #[test]
        fn prop_more_points_ranks_higher(
            points in proptest::collection::vec(0u32..50, 2..20),
            won in proptest::collection::vec(0u32..10, 20),
            avg in proptest::collection::vec(0.0f64..100.0, 20),
        ) {
            let tracker = PlayerStatisticsTracker::default();
            let stats: Vec<PlayerStatistics> = points
                .iter()
                .enumerate()
                .map(|(i, p)| PlayerStatistics {
                    tournament_points: *p,
                    matches_played: 10,
                    matches_won: won[i],
                    average_score: avg[i],
                    ..Default::default()
                })
                .collect();
            let standings = stats
                .iter()
                .enumerate()
                .map(|(i, s)| Standing {
                    player_id: i as PlayerId,
                    name: "",
                    eliminated: false,
                    stats: s,
                })
                .collect();

            let ranking = tracker.rank_players(standings);
            for pair in ranking.windows(2) {
                prop_assert!(pair[0].tournament_points >= pair[1].tournament_points);
                prop_assert_eq!(pair[0].rank + 1, pair[1].rank);
            }
        }
    }
}
