//! WebSocket を使った MessagePusher 実装
//!
//! WebSocket 接続の受付と sender の生成は UI 層（`ui/handler/websocket.rs`）が行い、
//! この実装は受け取った sender を接続 ID ごとに管理して通知を送ります。
//! 通知の JSON 化はここで一度だけ行い、同じ文字列を全宛先に配ります。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RaceNotice},
    infrastructure::dto::conversion::encode_notice,
};

pub struct WebSocketMessagePusher {
    /// Key: connection id, Value: outbound channel of that socket
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of registered connections
    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(notice: &RaceNotice) -> Result<String, MessagePushError> {
    encode_notice(notice).map_err(|e| MessagePushError::PushFailed(e.to_string()))
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notice: &RaceNotice,
    ) -> Result<(), MessagePushError> {
        let content = encode(notice)?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        sender
            .send(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notice: &RaceNotice,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let content = encode(notice)?;
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                Some(sender) => {
                    // 切断直後の送信失敗は許容する
                    if let Err(e) = sender.send(content.clone()) {
                        tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                    }
                }
                None => {
                    tracing::warn!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }
}
