//! Per-user career statistics kept in memory.
//!
//! A user's row is created the first time one of their games is folded in.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{CollaboratorError, UserId, UserStatsUpdater};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub total_games: u64,
    pub total_wins: u64,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub best_wpm: f64,
}

impl UserStats {
    fn fold(&mut self, wpm: f64, accuracy: f64, is_winner: bool) {
        let old_games = self.total_games as f64;
        self.total_games += 1;
        let games = self.total_games as f64;
        self.average_wpm = (self.average_wpm * old_games + wpm) / games;
        self.average_accuracy = (self.average_accuracy * old_games + accuracy) / games;
        self.best_wpm = self.best_wpm.max(wpm);
        if is_winner {
            self.total_wins += 1;
        }
    }
}

#[derive(Default)]
pub struct InMemoryUserStatsStore {
    users: RwLock<HashMap<UserId, UserStats>>,
}

impl InMemoryUserStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &UserId) -> Option<UserStats> {
        self.users.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl UserStatsUpdater for InMemoryUserStatsStore {
    async fn update_stats(
        &self,
        user_id: &UserId,
        wpm: f64,
        accuracy: f64,
        is_winner: bool,
    ) -> Result<(), CollaboratorError> {
        let mut users = self.users.write().await;
        users
            .entry(user_id.clone())
            .or_default()
            .fold(wpm, accuracy, is_winner);
        Ok(())
    }

    async fn record_win(&self, user_id: &UserId) -> Result<(), CollaboratorError> {
        let mut users = self.users.write().await;
        let stats = users
            .get_mut(user_id)
            .ok_or_else(|| CollaboratorError::UserNotFound(user_id.to_string()))?;
        stats.total_wins += 1;
        Ok(())
    }
}
