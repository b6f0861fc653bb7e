//! Tournament lifecycle and the engine that runs tournaments.
//!
//! This module provides:
//! - Tournament creation from a confirmed lobby roster
//! - Starting, match activation and result processing
//! - Player status, statistics and ranking upkeep
//! - One actor per tournament, registered in an engine-owned store
//! - Update events for subscribers
//!
//! ## Example
//!
//! ```no_run
//! use dilemma_arena::tournament::{
//!     EngineConfig, RosterEntry, TournamentEngine, TournamentFormat, TournamentRequest,
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = TournamentEngine::new(EngineConfig::default())?;
//!
//!     let players = (1..=8)
//!         .map(|id| RosterEntry::new(id, format!("player{id}")))
//!         .collect();
//!     let request =
//!         TournamentRequest::new(Uuid::new_v4(), players, TournamentFormat::DoubleElimination);
//!
//!     let tournament = engine.create_tournament(request).await?;
//!     engine.start_tournament(tournament.id).await?;
//!
//!     for pairing in engine.get_next_matches(tournament.id).await? {
//!         println!("{} vs {}", pairing.player1, pairing.player2);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod config;
pub mod engine;
pub mod errors;
pub mod lifecycle;
pub mod messages;
pub mod models;
pub mod store;

pub use actor::{TournamentActor, TournamentHandle};
pub use config::{ABSOLUTE_MAX_PLAYERS, EngineConfig};
pub use engine::TournamentEngine;
pub use errors::{TournamentError, TournamentResult};
pub use lifecycle::TournamentRunner;
pub use messages::{SubscriberId, TournamentMessage};
pub use models::{
    LobbyId, Player, PlayerId, PlayerStatus, RosterEntry, RosterState, Tournament,
    TournamentFormat, TournamentId, TournamentInfo, TournamentRequest, TournamentState,
    TournamentUpdate,
};
pub use store::TournamentStore;
