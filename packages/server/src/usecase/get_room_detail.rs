//! UseCase: 部屋の詳細取得

use std::sync::Arc;

use crate::{
    domain::{RepositoryError, Room, RoomId, RoomRepository},
    usecase::error::GetRoomDetailError,
};

/// 部屋の詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 部屋の詳細取得を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - HTTP パスで受け取った部屋 ID
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 部屋のスナップショット
    /// * `Err(GetRoomDetailError)` - ID が不正、または部屋が存在しない
    pub async fn execute(&self, room_id: String) -> Result<Room, GetRoomDetailError> {
        let room_id = RoomId::new(room_id.clone())
            .map_err(|_| GetRoomDetailError::InvalidRoomId(room_id))?;
        self.repository.get(&room_id).await.map_err(|e| match e {
            RepositoryError::RoomNotFound(id) => GetRoomDetailError::RoomNotFound(id),
            other => GetRoomDetailError::RoomNotFound(other.to_string()),
        })
    }
}
