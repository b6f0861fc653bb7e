//! Tournament actor implementation with async message handling.

use super::{
    errors::{TournamentError, TournamentResult},
    lifecycle::TournamentRunner,
    messages::{SubscriberId, TournamentMessage},
    models::{TournamentId, TournamentUpdate},
};
use crate::bracket::MatchResult;
use crate::security::AntiCollusionDetector;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Tournament actor handle for sending messages
#[derive(Debug, Clone)]
pub struct TournamentHandle {
    sender: mpsc::Sender<TournamentMessage>,
    tournament_id: TournamentId,
}

impl TournamentHandle {
    pub fn new(sender: mpsc::Sender<TournamentMessage>, tournament_id: TournamentId) -> Self {
        Self {
            sender,
            tournament_id,
        }
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Send a message to the tournament
    pub async fn send(&self, message: TournamentMessage) -> TournamentResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TournamentError::ActorUnavailable)
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Actor owning a single tournament
pub struct TournamentActor {
    id: TournamentId,

    runner: TournamentRunner,

    /// Message inbox
    inbox: mpsc::Receiver<TournamentMessage>,

    /// Shared across every tournament of an engine
    detector: Arc<AntiCollusionDetector>,

    is_closed: bool,

    /// Update event subscribers
    subscribers: HashMap<SubscriberId, mpsc::Sender<TournamentUpdate>>,
}

impl TournamentActor {
    /// Create a new tournament actor
    ///
    /// # Returns
    ///
    /// * `(TournamentActor, TournamentHandle)` - Actor and handle for sending messages
    pub fn new(
        runner: TournamentRunner,
        mailbox_capacity: usize,
        detector: Arc<AntiCollusionDetector>,
    ) -> (Self, TournamentHandle) {
        let (sender, inbox) = mpsc::channel(mailbox_capacity);
        let id = runner.id();

        let actor = Self {
            id,
            runner,
            inbox,
            detector,
            is_closed: false,
            subscribers: HashMap::new(),
        };

        (actor, TournamentHandle::new(sender, id))
    }

    /// Run the actor event loop until closed or every handle is dropped
    pub async fn run(mut self) {
        log::info!("Tournament {} actor starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
            if self.is_closed {
                break;
            }
        }

        log::info!("Tournament {} actor stopped", self.id);
    }

    async fn handle_message(&mut self, message: TournamentMessage) {
        match message {
            TournamentMessage::Start { response } => {
                let result = self.runner.start();
                if let Ok(update) = &result {
                    self.notify(update);
                }
                let _ = response.send(result);
            }

            TournamentMessage::ProcessResult { result, response } => {
                let outcome = self.process_result(result).await;
                let _ = response.send(outcome);
            }

            TournamentMessage::GetNextMatches { response } => {
                let _ = response.send(self.runner.next_matches());
            }

            TournamentMessage::CreateActiveMatch { pairing, response } => {
                let _ = response.send(self.runner.create_active_match(pairing));
            }

            TournamentMessage::GetSnapshot { response } => {
                let _ = response.send(self.runner.tournament().clone());
            }

            TournamentMessage::GetPlayer {
                player_id,
                response,
            } => {
                let _ = response.send(self.runner.tournament().player(player_id).cloned());
            }

            TournamentMessage::GetRankings { response } => {
                let tournament = self.runner.tournament();
                let rankings = if tournament.is_completed() {
                    tournament.final_rankings.clone()
                } else {
                    self.runner.rankings()
                };
                let _ = response.send(rankings);
            }

            TournamentMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                log::debug!(
                    "Subscriber {} subscribed to tournament {}",
                    subscriber_id,
                    self.id
                );
            }

            TournamentMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!(
                    "Subscriber {} unsubscribed from tournament {}",
                    subscriber_id,
                    self.id
                );
            }

            TournamentMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    async fn process_result(&mut self, result: MatchResult) -> TournamentResult<TournamentUpdate> {
        let update = self.runner.process_match_result(result.clone())?;

        // Shadow flags only; never affects the update
        self.detector.analyze_result(self.id, &result).await;

        self.notify(&update);
        Ok(update)
    }

    /// Broadcast an update to all subscribers
    fn notify(&mut self, update: &TournamentUpdate) {
        self.subscribers.retain(|subscriber_id, sender| {
            match sender.try_send(update.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} channel full, dropping {} update",
                        subscriber_id,
                        update.kind()
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", subscriber_id);
                    false
                }
            }
        });
    }
}
