//! UseCase: クライアント切断
//!
//! 送信チャネルの登録を解除し、部屋に参加していればその部屋から退出させます。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, MessagePusher, SessionRepository},
    usecase::race_coordinator::RaceCoordinator,
};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    coordinator: Arc<RaceCoordinator>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        coordinator: Arc<RaceCoordinator>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
            coordinator,
        }
    }

    /// 切断処理を実行
    ///
    /// 部屋の変更に失敗してもログに残すだけで、接続の後始末は必ず完了します。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断された接続
    pub async fn execute(&self, connection_id: &ConnectionId) {
        self.message_pusher.unregister_client(connection_id).await;

        if let Some(session) = self.sessions.find_by_connection(connection_id).await {
            let room_id = session.room_id.clone();
            if let Err(e) = self.coordinator.depart(session).await {
                tracing::warn!(
                    "Disconnect of '{}' left room '{}' unchanged: {}",
                    connection_id,
                    room_id,
                    e
                );
            }
        }
        tracing::info!("Connection '{}' closed", connection_id);
    }
}
