//! Registry of live tournament actors.

use super::actor::TournamentHandle;
use super::models::TournamentId;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Handles of every live tournament, keyed by id
#[derive(Debug, Clone, Default)]
pub struct TournamentStore {
    handles: Arc<RwLock<HashMap<TournamentId, TournamentHandle>>>,
}

impl TournamentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: TournamentHandle) {
        let mut handles = self.handles.write().await;
        handles.insert(handle.tournament_id(), handle);
    }

    pub async fn get(&self, tournament_id: TournamentId) -> Option<TournamentHandle> {
        let handles = self.handles.read().await;
        handles.get(&tournament_id).cloned()
    }

    pub async fn remove(&self, tournament_id: TournamentId) -> Option<TournamentHandle> {
        let mut handles = self.handles.write().await;
        handles.remove(&tournament_id)
    }

    /// Handles of every registered tournament
    pub async fn list(&self) -> Vec<TournamentHandle> {
        let handles = self.handles.read().await;
        handles.values().cloned().collect()
    }

    /// Remove and return every handle
    pub async fn drain(&self) -> Vec<TournamentHandle> {
        let mut handles = self.handles.write().await;
        handles.drain().map(|(_, handle)| handle).collect()
    }

    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }
}
