//! Security module providing bracket integrity and anti-collusion features.
//!
//! ## Integrity
//!
//! Every bracket is checked structurally before a tournament is registered,
//! and every submitted match result is checked before it is applied:
//! - **Bracket**: unique seeding, fixed round count, no player twice per round
//! - **Results**: known open match, same participants, plausible scores,
//!   equal move counts
//!
//! ## Anti-Collusion
//!
//! Detects suspicious patterns without acting on them:
//! - **Score dumping**: a zero-point loss against a high score
//! - **Repeated forfeits**: the same player forfeiting to the same opponent
//! - **Win rate anomalies**: lopsided head-to-head records across tournaments
//! - **Shadow flagging**: all flags require review
//!
//! ## Seeding
//!
//! Elimination brackets shuffle their roster through [`SeedRandomizer`] so
//! that registration order cannot be used to pick an opening opponent.
//!
//! ## Example
//!
//! ```
//! use dilemma_arena::security::{SeedingPolicy, SeedRandomizer};
//!
//! let mut randomizer = SeedRandomizer::with_seed(7);
//! let seeded = randomizer.seed_players(&[1, 2, 3, 4]);
//! assert_eq!(seeded.len(), 4);
//!
//! assert_eq!(SeedingPolicy::RosterOrder.apply(&[3, 1, 2]), vec![3, 1, 2]);
//! ```

pub mod anti_collusion;
pub mod errors;
pub mod integrity;
pub mod seed_randomizer;

pub use anti_collusion::{
    AntiCollusionDetector, CollusionFlag, CollusionThresholds, FlagSeverity, FlagType,
};
pub use errors::{AntiCollusionError, AntiCollusionResult, IntegrityError, ResultValidationError};
pub use integrity::{
    DEFAULT_MAX_MATCH_SCORE, DEFAULT_MAX_MOVES_PER_MATCH, DEFAULT_MAX_POINTS_PER_MOVE,
    IntegrityValidator,
};
pub use seed_randomizer::{SeedRandomizer, SeedingPolicy};
