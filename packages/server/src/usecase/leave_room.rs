//! UseCase: 部屋からの退出
//!
//! 待機中・カウントダウン中は名簿から外れ（カウントダウンは取り消し）、
//! レース中は最後の状態のまま凍結されます。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, RepositoryError, RoomId, SessionRepository},
    usecase::{error::LeaveError, race_coordinator::RaceCoordinator},
};

/// 部屋からの退出のユースケース
pub struct LeaveRoomUseCase {
    sessions: Arc<dyn SessionRepository>,
    coordinator: Arc<RaceCoordinator>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(sessions: Arc<dyn SessionRepository>, coordinator: Arc<RaceCoordinator>) -> Self {
        Self {
            sessions,
            coordinator,
        }
    }

    /// 退出を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 退出要求を送った接続
    /// * `room_id` - 退出する部屋（接続が束縛されている部屋と一致する必要がある）
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 接続の束縛が外れ、部屋のメンバーに通知された
    /// * `Err(LeaveError)` - その部屋に参加していない、または部屋が存在しない
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), LeaveError> {
        let session = self
            .sessions
            .find_by_connection(connection_id)
            .await
            .filter(|s| &s.room_id == room_id)
            .ok_or_else(|| LeaveError::NotInRoom(room_id.to_string()))?;

        match self.coordinator.depart(session).await {
            Ok(_) => Ok(()),
            Err(RepositoryError::RoomNotFound(id)) => Err(LeaveError::RoomNotFound(id)),
            Err(e) => {
                // the player is unbound either way
                tracing::warn!("Leaving room '{}' did not change it: {}", room_id, e);
                Ok(())
            }
        }
    }
}
