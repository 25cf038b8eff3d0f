//! MessagePusher trait 定義
//!
//! クライアントへの通知の抽象化。トランスポート（WebSocket など）の実装は
//! Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RaceNotice};

/// Outbound channel of one connection; carries encoded messages
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register the outbound channel of a new connection
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Send a notice to one connection
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notice: &RaceNotice,
    ) -> Result<(), MessagePushError>;

    /// Send a notice to several connections. Individual delivery failures are
    /// tolerated and logged.
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notice: &RaceNotice,
    ) -> Result<(), MessagePushError>;
}
