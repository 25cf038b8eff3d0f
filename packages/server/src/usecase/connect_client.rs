//! UseCase: クライアント接続
//!
//! 接続ごとに新しい `ConnectionId` を払い出し、送信チャネルを MessagePusher に登録します。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionIdFactory, ErrorCode, MessagePusher, PusherChannel, RaceNotice,
    ValueObjectError,
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 接続を登録
    ///
    /// # Arguments
    ///
    /// * `sender` - この接続宛てのメッセージを流す送信チャネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 払い出した接続 ID
    /// * `Err(ValueObjectError)` - ID の生成に失敗
    pub async fn execute(&self, sender: PusherChannel) -> Result<ConnectionId, ValueObjectError> {
        let connection_id = ConnectionIdFactory::generate()?;
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Connection '{}' opened", connection_id);
        Ok(connection_id)
    }

    /// Report an error to one connection only
    pub async fn send_error(&self, connection_id: &ConnectionId, code: ErrorCode, message: String) {
        let notice = RaceNotice::Error { code, message };
        if let Err(e) = self.message_pusher.push_to(connection_id, &notice).await {
            tracing::warn!("Failed to send error to '{}': {}", connection_id, e);
        }
    }
}
