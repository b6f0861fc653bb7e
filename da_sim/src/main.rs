//! Tournament simulator driving the dilemma arena engine.
//!
//! Runs whole tournaments between scripted strategy bots: each tournament
//! is created and started on the engine, its ready pairings are played as
//! iterated cooperate/betray matches and the results are fed back until a
//! winner is known.

mod config;
mod logging;
mod strategy;

use std::sync::Arc;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use dilemma_arena::bracket::{MatchPairing, MatchResult};
use dilemma_arena::stats::{RankingEntry, TournamentSummary};
use dilemma_arena::tournament::{
    PlayerId, RosterEntry, TournamentEngine, TournamentId, TournamentInfo, TournamentRequest,
    TournamentUpdate,
};
use pico_args::Arguments;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use uuid::Uuid;

use config::SimConfig;
use strategy::{Strategy, play_match};

const HELP: &str = "\
Simulate cooperate/betray tournaments between scripted bots

USAGE:
  da_sim [OPTIONS]

OPTIONS:
  --tournaments N          Tournaments to run concurrently  [default: env SIM_TOURNAMENTS or 1]
  --players     N          Players per tournament           [default: env SIM_PLAYERS or 8]
  --format      FORMAT     single_elimination, double_elimination or round_robin
                                                            [default: env SIM_FORMAT or single_elimination]
  --moves       N          Moves per match                  [default: env SIM_MOVES or 20]

FLAGS:
  --json                   Print a JSON report per finished tournament [default: env SIM_JSON]
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter (e.g., debug, dilemma_arena=debug)
  ARENA_MIN_PLAYERS        Engine minimum roster size
  ARENA_MAX_PLAYERS        Engine maximum roster size
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let json = pargs.contains("--json");
    let config = SimConfig::from_env(
        pargs.opt_value_from_str("--tournaments")?,
        pargs.opt_value_from_str("--players")?,
        pargs.opt_value_from_str("--format")?,
        pargs.opt_value_from_str("--moves")?,
        json,
    )?;
    config.validate()?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();
    tracing::info!(
        tournaments = config.tournaments,
        players = config.players,
        format = %config.format,
        moves = config.moves_per_match,
        "Starting simulation"
    );

    let engine = Arc::new(TournamentEngine::new(config.engine.clone())?);
    let config = Arc::new(config);

    let mut tasks = Vec::with_capacity(config.tournaments);
    for index in 0..config.tournaments {
        let engine = Arc::clone(&engine);
        let config = Arc::clone(&config);
        tasks.push(tokio::spawn(async move {
            run_tournament(&engine, &config, index).await
        }));
    }

    let mut failures = 0;
    for task in tasks {
        match task.await.context("tournament task panicked")? {
            Ok(id) => tracing::debug!(tournament = %id, "Tournament finished"),
            Err(e) => {
                failures += 1;
                tracing::error!("Tournament failed: {:#}", e);
            }
        }
    }

    let flags = engine.collusion_flags().await;
    for flag in &flags {
        tracing::warn!(
            flag_type = %flag.flag_type,
            player = flag.player_id,
            opponent = flag.opponent_id,
            tournament = %flag.tournament_id,
            "Collusion flag raised"
        );
    }
    tracing::info!(
        completed = config.tournaments - failures,
        failed = failures,
        collusion_flags = flags.len(),
        "Simulation finished"
    );

    engine.shutdown().await;

    if failures > 0 {
        anyhow::bail!("{failures} tournament(s) failed");
    }
    Ok(())
}

/// Machine-readable outcome of one tournament
#[derive(Debug, Serialize)]
struct TournamentReport {
    tournament: TournamentInfo,
    rankings: Vec<RankingEntry>,
    summary: Option<TournamentSummary>,
}

/// Create, play and clean up one tournament
async fn run_tournament(
    engine: &TournamentEngine,
    config: &SimConfig,
    index: usize,
) -> Result<TournamentId, Error> {
    let base = (index as PlayerId) * 1_000;
    let players = (1..=config.players as PlayerId)
        .map(|n| {
            let id = base + n;
            RosterEntry::new(id, format!("{}-{}", Strategy::for_player(id), id))
        })
        .collect();

    let request = TournamentRequest::new(Uuid::new_v4(), players, config.format);
    let tournament = engine.create_tournament(request).await?;
    let id = tournament.id;

    let update = engine.start_tournament(id).await?;
    log_update(&update);

    let mut rng = StdRng::from_rng(&mut rand::rng());
    loop {
        let pairings = engine.get_next_matches(id).await?;
        if pairings.is_empty() {
            break;
        }

        for pairing in pairings {
            engine.create_active_match(id, pairing).await?;
            let result = play(engine, id, &pairing, config.moves_per_match, &mut rng).await?;
            let update = engine.process_match_result(id, result).await?;
            log_update(&update);
        }
    }

    let finished = engine.get_tournament(id).await?;
    for entry in &finished.final_rankings {
        tracing::info!(
            tournament = %id,
            rank = entry.rank,
            player = %entry.name,
            points = entry.tournament_points,
            won = entry.matches_won,
            lost = entry.matches_lost,
            "Final standing"
        );
    }

    if config.json {
        let report = TournamentReport {
            tournament: finished.info(),
            rankings: finished.final_rankings,
            summary: finished.summary,
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    engine.cleanup_tournament(id).await?;
    Ok(id)
}

/// Play the match behind an active pairing and build its result
async fn play(
    engine: &TournamentEngine,
    id: TournamentId,
    pairing: &MatchPairing,
    moves: u32,
    rng: &mut StdRng,
) -> Result<MatchResult, Error> {
    let tournament = engine.get_tournament(id).await?;
    let game = tournament
        .bracket
        .matches()
        .find(|m| {
            !m.is_completed()
                && m.round_number == pairing.round_number
                && m.has_players(pairing.player1, pairing.player2)
        })
        .cloned()
        .context("active pairing has no open match")?;

    let outcome = play_match(
        Strategy::for_player(game.player1),
        Strategy::for_player(game.player2),
        moves,
        rng,
    );
    let winner_id = if outcome.player1_wins(rng) {
        game.player1
    } else {
        game.player2
    };
    logging::log_match(
        &id.to_string(),
        game.player1,
        game.player2,
        (outcome.player1_score, outcome.player2_score),
        winner_id,
    );

    Ok(MatchResult {
        match_id: game.id,
        player1_id: game.player1,
        player2_id: game.player2,
        winner_id,
        player1_score: outcome.player1_score,
        player2_score: outcome.player2_score,
        statistics: outcome.statistics,
        forfeit: false,
    })
}

fn log_update(update: &TournamentUpdate) {
    let tournament = update.tournament();
    match update {
        TournamentUpdate::TournamentStarted { next_matches, .. } => tracing::info!(
            tournament = %tournament.id,
            format = %tournament.format,
            matches = next_matches.len(),
            "Tournament started"
        ),
        TournamentUpdate::RoundAdvanced {
            completed_rounds,
            next_matches,
            ..
        } => tracing::info!(
            tournament = %tournament.id,
            completed = ?completed_rounds,
            current_round = tournament.current_round,
            ready = next_matches.len(),
            "Round advanced"
        ),
        TournamentUpdate::MatchResult {
            eliminated_players, ..
        } => tracing::debug!(
            tournament = %tournament.id,
            eliminated = ?eliminated_players,
            "Match recorded"
        ),
        TournamentUpdate::TournamentCompleted { winner, .. } => tracing::info!(
            tournament = %tournament.id,
            winner = ?winner,
            "Tournament completed"
        ),
    }
}
