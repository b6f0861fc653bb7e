//! Structured logging configuration.
//!
//! Library records emitted through the `log` facade are picked up by the
//! subscriber as well, so engine lifecycle logs and simulator events share
//! one output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Levels are configurable via the `RUST_LOG` env var, defaulting to `info`.
///
/// # Example
///
/// ```no_run
/// use da_sim::logging;
///
/// logging::init();
/// tracing::info!("Simulation starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log a finished match with its scores
pub fn log_match(tournament: &str, player1: i64, player2: i64, scores: (u32, u32), winner: i64) {
    tracing::debug!(
        tournament = tournament,
        player1 = player1,
        player2 = player2,
        player1_score = scores.0,
        player2_score = scores.1,
        winner = winner,
        "Match played"
    );
}
