//! Tournament actor message types.

use super::errors::TournamentResult;
use super::models::{Player, PlayerId, Tournament, TournamentUpdate};
use crate::bracket::{ActiveMatch, MatchPairing, MatchResult};
use crate::stats::RankingEntry;
use tokio::sync::{mpsc, oneshot};

/// Subscriber ID type
pub type SubscriberId = u64;

/// Messages that can be sent to a TournamentActor
#[derive(Debug)]
pub enum TournamentMessage {
    /// Start the tournament and arm its first round
    Start {
        response: oneshot::Sender<TournamentResult<TournamentUpdate>>,
    },

    /// Submit a finished match
    ProcessResult {
        result: MatchResult,
        response: oneshot::Sender<TournamentResult<TournamentUpdate>>,
    },

    /// Pairings ready to be played
    GetNextMatches {
        response: oneshot::Sender<Vec<MatchPairing>>,
    },

    /// Hand a ready pairing out for live play
    CreateActiveMatch {
        pairing: MatchPairing,
        response: oneshot::Sender<TournamentResult<ActiveMatch>>,
    },

    /// Full tournament snapshot
    GetSnapshot {
        response: oneshot::Sender<Tournament>,
    },

    GetPlayer {
        player_id: PlayerId,
        response: oneshot::Sender<Option<Player>>,
    },

    /// Current standings
    GetRankings {
        response: oneshot::Sender<Vec<RankingEntry>>,
    },

    /// Subscribe to update events
    Subscribe {
        subscriber_id: SubscriberId,
        sender: mpsc::Sender<TournamentUpdate>,
    },

    /// Unsubscribe from update events
    Unsubscribe { subscriber_id: SubscriberId },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },
}
