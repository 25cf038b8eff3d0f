//! Game results kept in memory, one row per `(user_id, room_id)`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{CollaboratorError, FinishRecord, GameResultSink, RoomId, UserId};

#[derive(Default)]
pub struct InMemoryGameResultStore {
    rows: RwLock<HashMap<(UserId, RoomId), FinishRecord>>,
}

impl InMemoryGameResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &UserId, room_id: &RoomId) -> Option<FinishRecord> {
        let rows = self.rows.read().await;
        rows.get(&(user_id.clone(), room_id.clone())).cloned()
    }

    /// Results of one room ordered by finish position
    pub async fn results_for_room(&self, room_id: &RoomId) -> Vec<FinishRecord> {
        let rows = self.rows.read().await;
        let mut results: Vec<FinishRecord> = rows
            .values()
            .filter(|r| &r.room_id == room_id)
            .cloned()
            .collect();
        results.sort_by_key(|r| r.finish_position);
        results
    }
}

#[async_trait]
impl GameResultSink for InMemoryGameResultStore {
    async fn record_result(&self, result: FinishRecord) -> Result<(), CollaboratorError> {
        let mut rows = self.rows.write().await;
        tracing::debug!(
            "Recording result of '{}' in room '{}' (winner: {})",
            result.user_id,
            result.room_id,
            result.is_winner
        );
        rows.insert((result.user_id.clone(), result.room_id.clone()), result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, room: &str, position: usize, is_winner: bool) -> FinishRecord {
        FinishRecord {
            user_id: UserId::new(user.to_string()).unwrap(),
            room_id: RoomId::new(room.to_string()).unwrap(),
            wpm: 20.0,
            accuracy: 100.0,
            correct_chars: 7,
            incorrect_chars: 0,
            total_chars: 7,
            time_taken_seconds: 6.0,
            finish_position: position,
            is_winner,
        }
    }

    #[tokio::test]
    async fn test_record_result_is_idempotent_per_pair() {
        // テスト項目: 同じ (user, room) の再記録は上書きされ、行は増えない
        // given (前提条件):
        let store = InMemoryGameResultStore::new();
        store.record_result(record("x", "r1", 1, false)).await.unwrap();

        // when (操作):
        store.record_result(record("x", "r1", 1, true)).await.unwrap();

        // then (期待する結果):
        let results = store
            .results_for_room(&RoomId::new("r1".to_string()).unwrap())
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_winner);
    }

    #[tokio::test]
    async fn test_results_for_room_ordered_by_position() {
        // テスト項目: 部屋ごとの結果が着順で返る
        // given (前提条件):
        let store = InMemoryGameResultStore::new();
        store.record_result(record("y", "r1", 2, false)).await.unwrap();
        store.record_result(record("x", "r1", 1, true)).await.unwrap();
        store.record_result(record("z", "r2", 1, true)).await.unwrap();

        // when (操作):
        let results = store
            .results_for_room(&RoomId::new("r1".to_string()).unwrap())
            .await;

        // then (期待する結果):
        let users: Vec<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["x", "y"]);
    }
}
