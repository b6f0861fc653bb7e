//! Tournament engine for spawning and driving tournament actors.

use super::{
    actor::{TournamentActor, TournamentHandle},
    config::EngineConfig,
    errors::{TournamentError, TournamentResult},
    lifecycle::TournamentRunner,
    messages::{SubscriberId, TournamentMessage},
    models::{
        Player, PlayerId, Tournament, TournamentId, TournamentInfo, TournamentRequest,
        TournamentUpdate,
    },
    store::TournamentStore,
};
use crate::bracket::{ActiveMatch, MatchPairing, MatchResult};
use crate::security::{AntiCollusionDetector, AntiCollusionResult, CollusionFlag};
use crate::stats::RankingEntry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};

/// Public async API over every live tournament.
///
/// Each tournament runs in its own actor task; calls for one tournament are
/// serialized through its inbox while different tournaments proceed in
/// parallel.
pub struct TournamentEngine {
    config: EngineConfig,

    /// Live actor handles
    store: TournamentStore,

    /// Shared by every tournament
    detector: Arc<AntiCollusionDetector>,

    next_subscriber_id: AtomicU64,
}

impl TournamentEngine {
    /// Create a new engine
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation
    pub fn new(config: EngineConfig) -> TournamentResult<Self> {
        config.validate()?;
        let detector = Arc::new(AntiCollusionDetector::new(config.collusion));

        Ok(Self {
            config,
            store: TournamentStore::new(),
            detector,
            next_subscriber_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Anti-collusion detector fed by every accepted result
    pub fn detector(&self) -> &AntiCollusionDetector {
        &self.detector
    }

    async fn handle(&self, tournament_id: TournamentId) -> TournamentResult<TournamentHandle> {
        self.store
            .get(tournament_id)
            .await
            .ok_or(TournamentError::TournamentNotFound(tournament_id))
    }

    /// Send a message built around a fresh reply channel and wait for the reply
    async fn request<T>(
        &self,
        tournament_id: TournamentId,
        message: impl FnOnce(oneshot::Sender<T>) -> TournamentMessage,
    ) -> TournamentResult<T> {
        let handle = self.handle(tournament_id).await?;
        let (tx, rx) = oneshot::channel();
        handle.send(message(tx)).await?;
        rx.await.map_err(|_| TournamentError::ActorUnavailable)
    }

    /// Validate a roster, build its bracket and spawn the tournament's actor
    ///
    /// # Returns
    ///
    /// * `Tournament` - Snapshot of the new tournament, in `NotStarted` state
    pub async fn create_tournament(
        &self,
        request: TournamentRequest,
    ) -> TournamentResult<Tournament> {
        let runner = TournamentRunner::create(request, &self.config)?;
        let snapshot = runner.tournament().clone();

        let (actor, handle) = TournamentActor::new(
            runner,
            self.config.mailbox_capacity,
            Arc::clone(&self.detector),
        );
        self.store.insert(handle).await;

        tokio::spawn(async move {
            actor.run().await;
        });

        Ok(snapshot)
    }

    pub async fn start_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<TournamentUpdate> {
        self.request(tournament_id, |response| TournamentMessage::Start { response })
            .await?
    }

    /// Validate and apply a finished match
    pub async fn process_match_result(
        &self,
        tournament_id: TournamentId,
        result: MatchResult,
    ) -> TournamentResult<TournamentUpdate> {
        self.request(tournament_id, |response| TournamentMessage::ProcessResult {
            result,
            response,
        })
        .await?
    }

    /// Pairings ready to be played. Repeated calls return the same list until
    /// a result or activation changes the bracket.
    pub async fn get_next_matches(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<MatchPairing>> {
        self.request(tournament_id, |response| TournamentMessage::GetNextMatches {
            response,
        })
        .await
    }

    pub async fn create_active_match(
        &self,
        tournament_id: TournamentId,
        pairing: MatchPairing,
    ) -> TournamentResult<ActiveMatch> {
        self.request(tournament_id, |response| TournamentMessage::CreateActiveMatch {
            pairing,
            response,
        })
        .await?
    }

    /// Snapshot of a tournament
    pub async fn get_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Tournament> {
        self.request(tournament_id, |response| TournamentMessage::GetSnapshot {
            response,
        })
        .await
    }

    /// Summaries of every live tournament, oldest first
    pub async fn list_tournaments(&self) -> Vec<TournamentInfo> {
        let mut infos = Vec::new();
        for handle in self.store.list().await {
            match self.get_tournament(handle.tournament_id()).await {
                Ok(tournament) => infos.push(tournament.info()),
                Err(e) => log::debug!(
                    "Skipping tournament {} in listing: {}",
                    handle.tournament_id(),
                    e
                ),
            }
        }
        infos.sort_by_key(|info| info.created_at);
        infos
    }

    pub async fn tournament_count(&self) -> usize {
        self.store.len().await
    }

    pub async fn get_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> TournamentResult<Player> {
        self.request(tournament_id, |response| TournamentMessage::GetPlayer {
            player_id,
            response,
        })
        .await?
        .ok_or(TournamentError::PlayerNotInTournament(player_id))
    }

    /// Current standings, or the final rankings once completed
    pub async fn get_rankings(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<RankingEntry>> {
        self.request(tournament_id, |response| TournamentMessage::GetRankings {
            response,
        })
        .await
    }

    /// Receive every `TournamentUpdate` the tournament emits from now on.
    ///
    /// Updates are dropped for a subscriber whose channel is full; a closed
    /// channel unsubscribes.
    pub async fn subscribe(
        &self,
        tournament_id: TournamentId,
        sender: mpsc::Sender<TournamentUpdate>,
    ) -> TournamentResult<SubscriberId> {
        let handle = self.handle(tournament_id).await?;
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        handle
            .send(TournamentMessage::Subscribe {
                subscriber_id,
                sender,
            })
            .await?;
        Ok(subscriber_id)
    }

    pub async fn unsubscribe(
        &self,
        tournament_id: TournamentId,
        subscriber_id: SubscriberId,
    ) -> TournamentResult<()> {
        self.handle(tournament_id)
            .await?
            .send(TournamentMessage::Unsubscribe { subscriber_id })
            .await
    }

    /// Every collusion flag raised so far
    pub async fn collusion_flags(&self) -> Vec<CollusionFlag> {
        self.detector.all_flags().await
    }

    pub async fn review_collusion_flag(
        &self,
        flag_id: u64,
        reviewer_id: PlayerId,
    ) -> AntiCollusionResult<()> {
        self.detector.mark_flag_reviewed(flag_id, reviewer_id).await
    }

    /// Stop a completed tournament's actor and forget it
    ///
    /// # Errors
    ///
    /// Returns `TournamentNotCompleted` while the tournament is still running
    pub async fn cleanup_tournament(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        let tournament = self.get_tournament(tournament_id).await?;
        if !tournament.is_completed() {
            return Err(TournamentError::TournamentNotCompleted);
        }

        Self::close(&self.handle(tournament_id).await?).await;
        self.store.remove(tournament_id).await;

        log::info!("Tournament {} cleaned up", tournament_id);
        Ok(())
    }

    /// Stop every actor regardless of state
    pub async fn shutdown(&self) {
        let handles = self.store.drain().await;
        let count = handles.len();
        for handle in handles {
            Self::close(&handle).await;
        }
        log::info!("Tournament engine shut down, {} actors stopped", count);
    }

    async fn close(handle: &TournamentHandle) {
        let (tx, rx) = oneshot::channel();
        if handle
            .send(TournamentMessage::Close { response: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::TournamentFormat;
    use crate::security::SeedingPolicy;
    use crate::tournament::models::{RosterEntry, TournamentState};
    use uuid::Uuid;

    fn request(n: i64) -> TournamentRequest {
        TournamentRequest::new(
            Uuid::new_v4(),
            (1..=n).map(|id| RosterEntry::new(id, format!("p{id}"))).collect(),
            TournamentFormat::SingleElimination,
        )
        .with_seeding(SeedingPolicy::RosterOrder)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig {
            max_players: 2,
            ..Default::default()
        };
        assert!(matches!(
            TournamentEngine::new(config),
            Err(TournamentError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let engine = TournamentEngine::new(EngineConfig::default()).unwrap();
        let id = Uuid::new_v4();
        assert_eq!(
            engine.start_tournament(id).await.err(),
            Some(TournamentError::TournamentNotFound(id))
        );
        assert!(engine.get_next_matches(id).await.is_err());
    }

    #[tokio::test]
    async fn test_create_and_start() {
        let engine = TournamentEngine::new(EngineConfig::default()).unwrap();
        let tournament = engine.create_tournament(request(8)).await.unwrap();
        assert_eq!(tournament.state, TournamentState::NotStarted);
        assert_eq!(engine.tournament_count().await, 1);

        let update = engine.start_tournament(tournament.id).await.unwrap();
        assert_eq!(update.tournament().state, TournamentState::InProgress);
        assert_eq!(engine.get_next_matches(tournament.id).await.unwrap().len(), 4);

        let player = engine.get_player(tournament.id, 3).await.unwrap();
        assert_eq!(player.name, "p3");
        assert_eq!(
            engine.get_player(tournament.id, 42).await.err(),
            Some(TournamentError::PlayerNotInTournament(42))
        );
    }

    #[tokio::test]
    async fn test_cleanup_requires_completion() {
        let engine = TournamentEngine::new(EngineConfig::default()).unwrap();
        let tournament = engine.create_tournament(request(4)).await.unwrap();
        assert_eq!(
            engine.cleanup_tournament(tournament.id).await.err(),
            Some(TournamentError::TournamentNotCompleted)
        );

        engine.shutdown().await;
        assert_eq!(engine.tournament_count().await, 0);
        assert!(engine.list_tournaments().await.is_empty());
    }
}
