//! UseCase: 部屋一覧の取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

/// 部屋一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// Snapshots of every room, oldest first
    pub async fn execute(&self) -> Vec<Room> {
        self.repository.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::Harness;

    #[tokio::test]
    async fn test_rooms_listed_oldest_first() {
        // テスト項目: 作成順に部屋が返る
        // given (前提条件):
        let harness = Harness::new(2);
        let first = harness.create_room("cat dog").await;
        let second = harness.create_room("dog cat").await;
        let usecase = GetRoomsUseCase::new(harness.rooms.clone());

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let ids: Vec<_> = rooms.iter().map(|r| r.id().clone()).collect();
        assert_eq!(ids, vec![first.id().clone(), second.id().clone()]);
    }
}
