//! # Dilemma Arena
//!
//! Tournament bracket engine for iterated cooperate/betray matches.
//!
//! The library turns a confirmed roster into a bracket, hands out pairings,
//! accepts match results and advances the tournament until a winner is
//! known. Match play itself happens elsewhere; the engine only sees results.
//!
//! ## Formats
//!
//! - **Single elimination**: one loss eliminates, byes fill odd rounds
//! - **Double elimination**: winners ladder, losers ladder and a grand final
//! - **Round robin**: everybody plays everybody once, ranked by points
//!
//! ## Core Modules
//!
//! - [`bracket`]: bracket generation and match progression per format
//! - [`stats`]: per-player statistics, tournament points and rankings
//! - [`security`]: bracket integrity, result validation, anti-collusion, seeding
//! - [`tournament`]: lifecycle, per-tournament actors and the async engine
//!
//! ## Example
//!
//! ```
//! use dilemma_arena::bracket::{BracketGenerator, Generator, TournamentFormat};
//! use uuid::Uuid;
//!
//! let generator = Generator::for_format(TournamentFormat::SingleElimination);
//! let bracket = generator.generate_bracket(Uuid::new_v4(), &[1, 2, 3, 4, 5]);
//!
//! assert_eq!(bracket.rounds.len(), 3);
//! assert_eq!(bracket.rounds[0].matches.len(), 2);
//! ```

/// Bracket generation and match progression.
pub mod bracket;
pub use bracket::{
    Bracket, BracketError, BracketGenerator, BracketUpdate, Generator, MatchPairing, MatchResult,
    MatchStatistics,
};

/// Player statistics and rankings.
pub mod stats;

/// Integrity checks, anti-collusion and seeding.
pub mod security;

/// Tournament lifecycle and engine.
pub mod tournament;
pub use tournament::{
    EngineConfig, TournamentEngine, TournamentError, TournamentRequest, TournamentResult,
    TournamentUpdate,
};
