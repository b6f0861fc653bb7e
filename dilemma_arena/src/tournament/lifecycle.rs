//! Synchronous lifecycle transitions on an owned tournament.
//!
//! A [`TournamentRunner`] owns one [`Tournament`] and applies every
//! transition to it. It does no locking or I/O; the actor serializes access.

use super::config::EngineConfig;
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Player, PlayerStatus, RosterState, Tournament, TournamentRequest, TournamentState,
    TournamentUpdate,
};
use crate::bracket::{
    ActiveMatch, BracketGenerator, BracketUpdate, Generator, MatchPairing, MatchResult,
    MatchStatus, PlayerId, RoundStatus, TournamentId,
};
use crate::security::{IntegrityValidator, ResultValidationError};
use crate::stats::{PlayerStatisticsTracker, RankingEntry, Standing};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Owns a tournament and drives it through its lifecycle
#[derive(Debug, Clone)]
pub struct TournamentRunner {
    tournament: Tournament,
    generator: Generator,
    validator: IntegrityValidator,
    tracker: PlayerStatisticsTracker,
}

impl TournamentRunner {
    /// Validate a creation request and build the tournament with its bracket.
    pub fn create(request: TournamentRequest, config: &EngineConfig) -> TournamentResult<Self> {
        if request.roster_state != RosterState::ReadyToStart {
            return Err(TournamentError::RosterNotReady);
        }

        let count = request.players.len();
        if count < config.min_players {
            return Err(TournamentError::InsufficientPlayers {
                needed: config.min_players,
                current: count,
            });
        }
        if count > config.max_players {
            return Err(TournamentError::TooManyPlayers {
                max: config.max_players,
                current: count,
            });
        }

        let mut seen = HashSet::with_capacity(count);
        for entry in &request.players {
            if !seen.insert(entry.player_id) {
                return Err(TournamentError::DuplicatePlayer(entry.player_id));
            }
        }

        let id = Uuid::new_v4();
        let generator = Generator::with_seeding(request.format, request.seeding);
        let validator = IntegrityValidator::new(
            config.max_points_per_move,
            config.max_match_score,
            config.max_moves_per_match,
        );
        let tracker = PlayerStatisticsTracker::new(config.scoring);

        let player_ids: Vec<PlayerId> = request.players.iter().map(|e| e.player_id).collect();
        let bracket = generator.generate_bracket(id, &player_ids);
        let total_rounds = generator.total_rounds(count);
        validator.validate_bracket(&bracket, total_rounds)?;

        let players = request
            .players
            .into_iter()
            .zip(1u32..)
            .map(|(entry, rank)| Player::new(entry.player_id, entry.name, rank))
            .collect();

        let tournament = Tournament {
            id,
            lobby_id: request.lobby_id,
            format: request.format,
            players,
            bracket,
            current_round: total_rounds.min(1),
            total_rounds,
            state: TournamentState::NotStarted,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            winner: None,
            final_rankings: Vec::new(),
            summary: None,
        };

        log::info!(
            "Tournament {} created: format={}, players={}, rounds={}",
            id,
            tournament.format,
            count,
            total_rounds
        );

        Ok(Self {
            tournament,
            generator,
            validator,
            tracker,
        })
    }

    pub fn id(&self) -> TournamentId {
        self.tournament.id
    }

    pub fn tournament(&self) -> &Tournament {
        &self.tournament
    }

    fn snapshot(&self) -> Box<Tournament> {
        Box::new(self.tournament.clone())
    }

    /// Move to `InProgress` and arm the first round
    pub fn start(&mut self) -> TournamentResult<TournamentUpdate> {
        match self.tournament.state {
            TournamentState::NotStarted => {}
            TournamentState::InProgress => return Err(TournamentError::AlreadyStarted),
            TournamentState::Completed => return Err(TournamentError::TournamentAlreadyCompleted),
        }

        let now = Utc::now();
        self.tournament.state = TournamentState::InProgress;
        self.tournament.started_at = Some(now);
        for player in &mut self.tournament.players {
            player.status = PlayerStatus::Ready;
        }
        self.arm_round(1, now);

        log::info!(
            "Tournament {} started with {} players",
            self.tournament.id,
            self.tournament.players.len()
        );

        Ok(TournamentUpdate::TournamentStarted {
            tournament: self.snapshot(),
            next_matches: self.next_matches(),
        })
    }

    /// Pairings ready to be played
    pub fn next_matches(&self) -> Vec<MatchPairing> {
        self.generator.get_next_matches(&self.tournament.bracket)
    }

    fn ensure_in_progress(&self) -> TournamentResult<()> {
        match self.tournament.state {
            TournamentState::InProgress => Ok(()),
            TournamentState::NotStarted => Err(TournamentError::TournamentNotStarted),
            TournamentState::Completed => Err(TournamentError::TournamentAlreadyCompleted),
        }
    }

    /// Hand a ready pairing out for live play
    pub fn create_active_match(&mut self, pairing: MatchPairing) -> TournamentResult<ActiveMatch> {
        self.ensure_in_progress()?;
        for player_id in [pairing.player1, pairing.player2] {
            if !self.tournament.is_participant(player_id) {
                return Err(TournamentError::PlayerNotInTournament(player_id));
            }
        }

        let bracket = &self.tournament.bracket;
        let (round_index, match_index) = bracket
            .rounds
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.number == pairing.round_number && r.status == RoundStatus::InProgress
            })
            .find_map(|(ri, r)| {
                r.matches
                    .iter()
                    .position(|m| {
                        m.status == MatchStatus::Scheduled
                            && m.has_players(pairing.player1, pairing.player2)
                    })
                    .map(|mi| (ri, mi))
            })
            .ok_or(ResultValidationError::PairingNotScheduled {
                player1: pairing.player1,
                player2: pairing.player2,
            })?;

        if let Some(busy) = [pairing.player1, pairing.player2]
            .into_iter()
            .find(|p| bracket.is_player_active(*p))
        {
            return Err(ResultValidationError::PlayerAlreadyInMatch(busy).into());
        }

        let now = Utc::now();
        let game = &mut self.tournament.bracket.rounds[round_index].matches[match_index];
        game.status = MatchStatus::InProgress;
        game.started_at = Some(now);
        let active = ActiveMatch {
            match_id: game.id,
            tournament_id: self.tournament.id,
            round_number: game.round_number,
            player1: game.player1,
            player2: game.player2,
            started_at: now,
        };
        self.tournament
            .bracket
            .active_matches
            .insert(active.match_id, active.clone());

        for player_id in [active.player1, active.player2] {
            if let Some(player) = self.tournament.player_mut(player_id) {
                player.status = PlayerStatus::InMatch;
            }
        }

        log::debug!(
            "Tournament {}: match {} active ({} vs {})",
            self.tournament.id,
            active.match_id,
            active.player1,
            active.player2
        );

        Ok(active)
    }

    /// Validate and apply a match result.
    ///
    /// Nothing is modified unless the result passes validation and the
    /// bracket accepts it.
    pub fn process_match_result(
        &mut self,
        result: MatchResult,
    ) -> TournamentResult<TournamentUpdate> {
        self.ensure_in_progress()?;

        if let Err(err) = self
            .validator
            .validate_match_result(&self.tournament.bracket, &result)
        {
            log::warn!(
                "Tournament {}: rejected result for match {}: {}",
                self.tournament.id,
                result.match_id,
                err
            );
            return Err(err.into());
        }

        let update = self
            .generator
            .process_match_result(&result, &self.tournament.bracket)?;

        Ok(self.commit(result, update))
    }

    fn commit(&mut self, result: MatchResult, update: BracketUpdate) -> TournamentUpdate {
        let now = Utc::now();
        let BracketUpdate {
            bracket,
            eliminated_players,
            next_matches,
            completed_rounds,
            ready_rounds,
            is_complete,
        } = update;
        self.tournament.bracket = bracket;

        for player_id in [result.player1_id, result.player2_id] {
            if let Some(player) = self.tournament.player_mut(player_id) {
                self.tracker
                    .record_result(&mut player.statistics, player_id, &result);
                player.status = PlayerStatus::Waiting;
            }
        }
        for player_id in &eliminated_players {
            if let Some(player) = self.tournament.player_mut(*player_id) {
                player.eliminate();
            }
        }

        for number in &completed_rounds {
            let bye_only = self
                .tournament
                .bracket
                .round(*number)
                .is_some_and(|r| r.matches.is_empty());
            if bye_only {
                self.credit_byes(*number);
            }
        }
        for number in &ready_rounds {
            self.arm_round(*number, now);
        }

        self.tournament.current_round = (self.tournament.bracket.completed_rounds() + 1)
            .min(self.tournament.total_rounds);

        let rankings = self.rerank();

        log::debug!(
            "Tournament {}: match {} won by {} ({}-{})",
            self.tournament.id,
            result.match_id,
            result.winner_id,
            result.player1_score,
            result.player2_score
        );

        if is_complete {
            return self.complete(result, rankings, now);
        }

        if completed_rounds.is_empty() {
            TournamentUpdate::MatchResult {
                tournament: self.snapshot(),
                result,
                eliminated_players,
            }
        } else {
            log::info!(
                "Tournament {}: completed rounds {:?}, {} matches ready",
                self.tournament.id,
                completed_rounds,
                next_matches.len()
            );
            TournamentUpdate::RoundAdvanced {
                tournament: self.snapshot(),
                result,
                completed_rounds,
                eliminated_players,
                next_matches,
            }
        }
    }

    fn complete(
        &mut self,
        result: MatchResult,
        rankings: Vec<RankingEntry>,
        now: DateTime<Utc>,
    ) -> TournamentUpdate {
        let winner = self
            .generator
            .champion(&self.tournament.bracket)
            .or_else(|| rankings.first().map(|e| e.player_id));

        self.tournament.state = TournamentState::Completed;
        self.tournament.ended_at = Some(now);
        self.tournament.winner = winner;
        self.tournament.current_round = self.tournament.total_rounds;
        self.tournament.summary = Some(self.tracker.summarize(
            &self.tournament.bracket,
            self.tournament.started_at,
            self.tournament.ended_at,
        ));
        self.tournament.final_rankings = rankings.clone();

        log::info!(
            "Tournament {} completed, winner: {:?}",
            self.tournament.id,
            winner
        );

        TournamentUpdate::TournamentCompleted {
            tournament: self.snapshot(),
            result,
            winner,
            rankings,
        }
    }

    /// Arm a populated round, credit its byes and ready its players
    fn arm_round(&mut self, number: u32, now: DateTime<Utc>) {
        if !self.tournament.bracket.arm_round(number, now) {
            return;
        }
        self.credit_byes(number);

        let scheduled: Vec<PlayerId> = self
            .tournament
            .bracket
            .round(number)
            .map(|r| r.matches.iter().flat_map(|m| [m.player1, m.player2]).collect())
            .unwrap_or_default();
        for player_id in scheduled {
            if let Some(player) = self.tournament.player_mut(player_id)
                && player.status == PlayerStatus::Waiting
            {
                player.status = PlayerStatus::Ready;
            }
        }
    }

    fn credit_byes(&mut self, number: u32) {
        let byes = self
            .tournament
            .bracket
            .round(number)
            .map(|r| r.byes.clone())
            .unwrap_or_default();
        for player_id in byes {
            if let Some(player) = self.tournament.player_mut(player_id) {
                self.tracker.record_bye(&mut player.statistics);
            }
        }
    }

    /// Current standings, without touching stored ranks
    pub fn rankings(&self) -> Vec<RankingEntry> {
        let standings = self
            .tournament
            .players
            .iter()
            .map(|p| Standing {
                player_id: p.id,
                name: &p.name,
                eliminated: p.eliminated,
                stats: &p.statistics,
            })
            .collect();
        self.tracker.rank_players(standings)
    }

    fn rerank(&mut self) -> Vec<RankingEntry> {
        let rankings = self.rankings();
        for entry in &rankings {
            if let Some(player) = self.tournament.player_mut(entry.player_id) {
                player.rank = entry.rank;
            }
        }
        rankings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{MatchStatistics, TournamentFormat};
    use crate::security::SeedingPolicy;
    use crate::tournament::models::RosterEntry;

    fn request(n: i64, format: TournamentFormat) -> TournamentRequest {
        TournamentRequest::new(
            Uuid::new_v4(),
            (1..=n)
                .map(|id| RosterEntry::new(id, format!("player{id}")))
                .collect(),
            format,
        )
        .with_seeding(SeedingPolicy::RosterOrder)
    }

    fn new_runner(n: i64, format: TournamentFormat) -> TournamentRunner {
        TournamentRunner::create(request(n, format), &EngineConfig::default()).unwrap()
    }

    fn result(
        pairing: &MatchPairing,
        runner: &TournamentRunner,
        winner: PlayerId,
        scores: (u32, u32),
    ) -> MatchResult {
        let game = runner
            .tournament()
            .bracket
            .matches()
            .find(|m| {
                m.round_number == pairing.round_number
                    && m.has_players(pairing.player1, pairing.player2)
            })
            .unwrap();
        let (p1, p2) = if winner == game.player1 {
            scores
        } else {
            (scores.1, scores.0)
        };
        MatchResult {
            match_id: game.id,
            player1_id: game.player1,
            player2_id: game.player2,
            winner_id: winner,
            player1_score: p1,
            player2_score: p2,
            statistics: MatchStatistics {
                player1_cooperations: 5,
                player1_betrayals: 5,
                player2_cooperations: 5,
                player2_betrayals: 5,
                duration_ms: 100,
            },
            forfeit: false,
        }
    }

    #[test]
    fn test_create_validates_roster() {
        let config = EngineConfig::default();

        let err = TournamentRunner::create(request(3, TournamentFormat::RoundRobin), &config);
        assert_eq!(
            err.err(),
            Some(TournamentError::InsufficientPlayers { needed: 4, current: 3 })
        );

        let err = TournamentRunner::create(request(257, TournamentFormat::RoundRobin), &config);
        assert_eq!(
            err.err(),
            Some(TournamentError::TooManyPlayers { max: 256, current: 257 })
        );

        let mut duplicate = request(4, TournamentFormat::SingleElimination);
        duplicate.players.push(RosterEntry::new(2, "again"));
        assert_eq!(
            TournamentRunner::create(duplicate, &config).err(),
            Some(TournamentError::DuplicatePlayer(2))
        );

        let mut forming = request(4, TournamentFormat::SingleElimination);
        forming.roster_state = RosterState::Forming;
        assert_eq!(
            TournamentRunner::create(forming, &config).err(),
            Some(TournamentError::RosterNotReady)
        );
    }

    #[test]
    fn test_create_initial_state() {
        let runner = new_runner(6, TournamentFormat::DoubleElimination);
        let t = runner.tournament();
        assert_eq!(t.state, TournamentState::NotStarted);
        assert_eq!(t.total_rounds, 3 + 4 + 1);
        assert_eq!(t.current_round, 1);
        assert_eq!(t.players.len(), 6);
        assert!(t.players.iter().all(|p| p.status == PlayerStatus::Waiting));
        assert!(runner.next_matches().is_empty());
    }

    #[test]
    fn test_start_transitions() {
        let mut runner = new_runner(4, TournamentFormat::SingleElimination);
        let update = runner.start().unwrap();
        assert_eq!(update.kind(), "tournament_started");
        assert_eq!(runner.tournament().state, TournamentState::InProgress);
        assert!(runner.tournament().players.iter().all(|p| p.status == PlayerStatus::Ready));
        assert_eq!(runner.next_matches().len(), 2);
        assert_eq!(runner.next_matches(), runner.next_matches());

        assert_eq!(runner.start().err(), Some(TournamentError::AlreadyStarted));
    }

    #[test]
    fn test_result_before_start_rejected() {
        let mut runner = new_runner(4, TournamentFormat::SingleElimination);
        let game = runner.tournament().bracket.rounds[0].matches[0].clone();
        let pairing = game.pairing();
        let r = result(&pairing, &runner, game.player1, (30, 20));
        assert_eq!(
            runner.process_match_result(r).err(),
            Some(TournamentError::TournamentNotStarted)
        );
    }

    #[test]
    fn test_active_match_flow() {
        let mut runner = new_runner(4, TournamentFormat::SingleElimination);
        runner.start().unwrap();
        let pairing = runner.next_matches()[0];

        let active = runner.create_active_match(pairing).unwrap();
        assert!(active.has_players(pairing.player1, pairing.player2));
        let t = runner.tournament();
        assert_eq!(t.player(pairing.player1).unwrap().status, PlayerStatus::InMatch);
        assert_eq!(t.bracket.active_matches.len(), 1);
        assert_eq!(runner.next_matches().len(), 1);

        assert_eq!(
            runner.create_active_match(pairing).err(),
            Some(TournamentError::MatchResultValidationFailed(
                ResultValidationError::PairingNotScheduled {
                    player1: pairing.player1,
                    player2: pairing.player2
                }
            ))
        );
        assert_eq!(
            runner
                .create_active_match(MatchPairing::new(pairing.player1, 99, 1))
                .err(),
            Some(TournamentError::PlayerNotInTournament(99))
        );

        let r = result(&pairing, &runner, pairing.player1, (30, 20));
        runner.process_match_result(r).unwrap();
        let t = runner.tournament();
        assert!(t.bracket.active_matches.is_empty());
        assert_eq!(t.player(pairing.player1).unwrap().status, PlayerStatus::Waiting);
        assert_eq!(t.player(pairing.player2).unwrap().status, PlayerStatus::Eliminated);
    }

    #[test]
    fn test_single_elimination_scenario() {
        // A beats B 30-20, C beats D 25-10, A beats C
        let mut runner = new_runner(4, TournamentFormat::SingleElimination);
        runner.start().unwrap();
        let first = runner.next_matches();

        let update = runner
            .process_match_result(result(&first[0], &runner, 1, (30, 20)))
            .unwrap();
        assert_eq!(update.kind(), "match_result");
        let update = runner
            .process_match_result(result(&first[1], &runner, 3, (25, 10)))
            .unwrap();
        assert_eq!(update.kind(), "round_advanced");
        assert_eq!(runner.tournament().current_round, 2);

        let finals = runner.next_matches();
        assert_eq!(finals.len(), 1);
        assert!(finals[0].has_players(1, 3));

        let update = runner
            .process_match_result(result(&finals[0], &runner, 1, (28, 22)))
            .unwrap();
        let TournamentUpdate::TournamentCompleted {
            winner,
            rankings,
            tournament,
            ..
        } = update
        else {
            panic!("expected completion");
        };
        assert_eq!(winner, Some(1));
        assert_eq!(rankings[0].player_id, 1);
        assert_eq!(tournament.state, TournamentState::Completed);
        assert!(tournament.ended_at.is_some());
        assert_eq!(tournament.player(1).unwrap().rank, 1);
        assert_eq!(tournament.summary.as_ref().unwrap().total_matches, 3);
        assert_eq!(
            runner.process_match_result(result(&finals[0], &runner, 1, (28, 22))).err(),
            Some(TournamentError::TournamentAlreadyCompleted)
        );
        assert_eq!(runner.start().err(), Some(TournamentError::TournamentAlreadyCompleted));
    }

    #[test]
    fn test_rejected_result_leaves_state_untouched() {
        let mut runner = new_runner(4, TournamentFormat::RoundRobin);
        runner.start().unwrap();
        let before = runner.tournament().clone();

        let pairing = runner.next_matches()[0];
        let mut bogus = result(&pairing, &runner, pairing.player1, (30, 20));
        bogus.match_id = Uuid::new_v4();
        assert!(matches!(
            runner.process_match_result(bogus),
            Err(TournamentError::MatchResultValidationFailed(
                ResultValidationError::UnknownMatch(_)
            ))
        ));

        let mut inflated = result(&pairing, &runner, pairing.player1, (30, 20));
        inflated.player1_score = 500;
        assert!(runner.process_match_result(inflated).is_err());

        assert_eq!(runner.tournament(), &before);
    }

    #[test]
    fn test_champion_can_trail_in_final_rankings() {
        let mut runner = new_runner(4, TournamentFormat::SingleElimination);
        runner.start().unwrap();

        let first = runner.next_matches();
        let blowout = result(&first[0], &runner, 1, (50, 0));
        runner.process_match_result(blowout).unwrap();
        let narrow = result(&first[1], &runner, 3, (10, 9));
        runner.process_match_result(narrow).unwrap();

        let finals = runner.next_matches();
        let upset = result(&finals[0], &runner, 3, (21, 20));
        runner.process_match_result(upset).unwrap();

        let tournament = runner.tournament();
        assert_eq!(tournament.winner, Some(3));
        assert_eq!(tournament.final_rankings[0].player_id, 1);
        assert_eq!(tournament.final_rankings[0].tournament_points, 7);
        assert_eq!(tournament.final_rankings[1].player_id, 3);
        assert_eq!(tournament.final_rankings[1].tournament_points, 6);
    }

    fn with_moves(mut result: MatchResult, cooperations: u32, betrayals: u32) -> MatchResult {
        result.statistics = MatchStatistics {
            player1_cooperations: cooperations,
            player1_betrayals: betrayals,
            player2_cooperations: cooperations,
            player2_betrayals: betrayals,
            duration_ms: 100,
        };
        result
    }

    #[test]
    fn test_malformed_move_counts_rejected() {
        let mut runner = new_runner(4, TournamentFormat::SingleElimination);
        runner.start().unwrap();
        let before = runner.tournament().clone();
        let pairing = runner.next_matches()[0];

        let overflowing = with_moves(
            result(&pairing, &runner, pairing.player1, (30, 20)),
            u32::MAX,
            1,
        );
        assert!(matches!(
            runner.process_match_result(overflowing),
            Err(TournamentError::MatchResultValidationFailed(
                ResultValidationError::TooManyMoves { .. }
            ))
        ));

        let oversized = with_moves(
            result(&pairing, &runner, pairing.player1, (30, 20)),
            3_000_000_000,
            0,
        );
        assert!(matches!(
            runner.process_match_result(oversized),
            Err(TournamentError::MatchResultValidationFailed(
                ResultValidationError::TooManyMoves { .. }
            ))
        ));

        assert_eq!(runner.tournament(), &before);
    }

    #[test]
    fn test_huge_move_counts_within_cap_are_folded_in() {
        let config = EngineConfig {
            max_moves_per_match: u32::MAX,
            ..Default::default()
        };
        let mut runner =
            TournamentRunner::create(request(4, TournamentFormat::SingleElimination), &config)
                .unwrap();
        runner.start().unwrap();

        let mut played = 0;
        loop {
            let pairings = runner.next_matches();
            if pairings.is_empty() {
                break;
            }
            for pairing in pairings {
                let r = with_moves(
                    result(&pairing, &runner, pairing.player1, (30, 20)),
                    3_000_000_000,
                    0,
                );
                runner.process_match_result(r).unwrap();
                played += 1;
            }
        }

        let tournament = runner.tournament();
        assert_eq!(played, 3);
        assert_eq!(tournament.state, TournamentState::Completed);
        assert_eq!(tournament.player(1).unwrap().statistics.cooperations, 6_000_000_000);
        assert_eq!(tournament.summary.as_ref().unwrap().cooperation_rate, 1.0);
    }

    #[test]
    fn test_byes_credited_on_arming() {
        let mut runner =
            TournamentRunner::create(request(5, TournamentFormat::RoundRobin), &EngineConfig {
                min_players: 2,
                ..Default::default()
            })
            .unwrap();
        runner.start().unwrap();
        let byes: u32 = runner
            .tournament()
            .players
            .iter()
            .map(|p| p.statistics.byes_received)
            .sum();
        assert_eq!(byes, 1);
    }
}
