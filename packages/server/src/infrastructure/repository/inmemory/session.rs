//! InMemory Session Repository 実装
//!
//! connection ↔ user ↔ room の対応を 2 つの HashMap で保持します。
//! 両方向の検索を同じロックの中で更新するので、片方だけが古い状態にはなりません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, RoomId, Session, SessionRepository, UserId};

#[derive(Default)]
struct SessionTables {
    by_connection: HashMap<ConnectionId, Session>,
    by_user: HashMap<UserId, ConnectionId>,
}

impl SessionTables {
    fn remove_connection(&mut self, connection_id: &ConnectionId) -> Option<Session> {
        let session = self.by_connection.remove(connection_id)?;
        if self.by_user.get(&session.user_id) == Some(connection_id) {
            self.by_user.remove(&session.user_id);
        }
        Some(session)
    }
}

/// インメモリ Session Repository 実装
#[derive(Default)]
pub struct InMemorySessionRepository {
    tables: Mutex<SessionTables>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn bind(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        room_id: RoomId,
    ) -> Vec<Session> {
        let mut tables = self.tables.lock().await;
        let mut replaced = Vec::new();

        if let Some(previous) = tables.remove_connection(&connection_id) {
            replaced.push(previous);
        }
        if let Some(previous_connection) = tables.by_user.get(&user_id).cloned() {
            if let Some(previous) = tables.remove_connection(&previous_connection) {
                replaced.push(previous);
            }
        }

        tables.by_user.insert(user_id.clone(), connection_id.clone());
        tables.by_connection.insert(
            connection_id.clone(),
            Session {
                connection_id,
                user_id,
                room_id,
            },
        );
        replaced
    }

    async fn unbind(&self, connection_id: &ConnectionId) -> Option<Session> {
        let mut tables = self.tables.lock().await;
        tables.remove_connection(connection_id)
    }

    async fn find_by_connection(&self, connection_id: &ConnectionId) -> Option<Session> {
        let tables = self.tables.lock().await;
        tables.by_connection.get(connection_id).cloned()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Option<Session> {
        let tables = self.tables.lock().await;
        tables
            .by_user
            .get(user_id)
            .and_then(|connection_id| tables.by_connection.get(connection_id))
            .cloned()
    }

    async fn connections_in_room(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let tables = self.tables.lock().await;
        let mut connections: Vec<ConnectionId> = tables
            .by_connection
            .values()
            .filter(|session| &session.room_id == room_id)
            .map(|session| session.connection_id.clone())
            .collect();
        connections.sort();
        connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_bind_and_lookup_both_directions() {
        // テスト項目: bind した対応を connection と user の両方から引ける
        // given (前提条件):
        let sessions = InMemorySessionRepository::new();

        // when (操作):
        let replaced = sessions.bind(conn("c1"), user("alice"), room("r1")).await;

        // then (期待する結果):
        assert!(replaced.is_empty());
        let by_conn = sessions.find_by_connection(&conn("c1")).await.unwrap();
        let by_user = sessions.find_by_user(&user("alice")).await.unwrap();
        assert_eq!(by_conn, by_user);
        assert_eq!(by_conn.room_id, room("r1"));
    }

    #[tokio::test]
    async fn test_unbind_removes_both_directions() {
        // テスト項目: unbind すると両方向の対応が消え、元のセッションが返る
        // given (前提条件):
        let sessions = InMemorySessionRepository::new();
        sessions.bind(conn("c1"), user("alice"), room("r1")).await;

        // when (操作):
        let removed = sessions.unbind(&conn("c1")).await;

        // then (期待する結果):
        assert_eq!(removed.map(|s| s.user_id), Some(user("alice")));
        assert!(sessions.find_by_connection(&conn("c1")).await.is_none());
        assert!(sessions.find_by_user(&user("alice")).await.is_none());
        assert!(sessions.unbind(&conn("c1")).await.is_none());
    }

    #[tokio::test]
    async fn test_user_has_at_most_one_room() {
        // テスト項目: 同じユーザーを別の部屋に bind すると古い対応は置き換えられる
        // given (前提条件):
        let sessions = InMemorySessionRepository::new();
        sessions.bind(conn("c1"), user("alice"), room("r1")).await;

        // when (操作): the same user arrives on a new connection
        let replaced = sessions.bind(conn("c2"), user("alice"), room("r2")).await;

        // then (期待する結果):
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].room_id, room("r1"));
        assert!(sessions.find_by_connection(&conn("c1")).await.is_none());
        assert_eq!(
            sessions.find_by_user(&user("alice")).await.unwrap().room_id,
            room("r2")
        );
        assert!(sessions.connections_in_room(&room("r1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_connections_in_room() {
        // テスト項目: 部屋ごとの接続一覧（ブロードキャスト対象）が取得できる
        // given (前提条件):
        let sessions = InMemorySessionRepository::new();
        sessions.bind(conn("c2"), user("bob"), room("r1")).await;
        sessions.bind(conn("c1"), user("alice"), room("r1")).await;
        sessions.bind(conn("c3"), user("carol"), room("r2")).await;

        // when (操作):
        let targets = sessions.connections_in_room(&room("r1")).await;

        // then (期待する結果):
        assert_eq!(targets, vec![conn("c1"), conn("c2")]);
    }
}
