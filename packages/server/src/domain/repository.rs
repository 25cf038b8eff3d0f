//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ConnectionId, DomainError, ReferenceText, RepositoryError, Room, RoomEvent, RoomId, Timestamp,
    UserId,
};

/// A transformation applied atomically to one room.
///
/// Returning `Err` discards every change the closure made.
pub type RoomMutation = Box<dyn FnOnce(&mut Room) -> Result<Vec<RoomEvent>, DomainError> + Send>;

/// Committed result of a `RoomRepository::mutate` call
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Snapshot of the room after the mutation
    pub room: Room,
    /// Events raised by the mutation, in order
    pub events: Vec<RoomEvent>,
}

/// Room Directory
///
/// Shared store of rooms. Mutations of one room are serialized; mutations of
/// different rooms do not contend. Readers only ever receive snapshots.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Register a new `Waiting` room
    async fn create(
        &self,
        reference_text: ReferenceText,
        capacity: usize,
        created_at: Timestamp,
    ) -> Result<Room, RepositoryError>;

    /// Snapshot of one room
    async fn get(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// Oldest room that is `Waiting` and not full
    async fn find_open_waiting_room(&self) -> Option<Room>;

    /// Apply `mutation` atomically and return the committed snapshot
    async fn mutate(
        &self,
        room_id: &RoomId,
        mutation: RoomMutation,
    ) -> Result<MutationOutcome, RepositoryError>;

    /// Snapshots of every room, oldest first
    async fn list(&self) -> Vec<Room>;

    /// Drop a room from the directory and return its last snapshot
    async fn remove(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;
}

/// One connection's membership in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// Session Directory
///
/// connection ↔ user ↔ room の対応表。レースのロジックは持たない。
/// A user is bound to at most one room at a time.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Bind a connection to a room. Replaces any earlier binding of the same
    /// connection or the same user and returns the replaced sessions.
    async fn bind(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        room_id: RoomId,
    ) -> Vec<Session>;

    /// Drop the binding of a connection
    async fn unbind(&self, connection_id: &ConnectionId) -> Option<Session>;

    async fn find_by_connection(&self, connection_id: &ConnectionId) -> Option<Session>;

    async fn find_by_user(&self, user_id: &UserId) -> Option<Session>;

    /// Connections currently bound to a room (broadcast targets)
    async fn connections_in_room(&self, room_id: &RoomId) -> Vec<ConnectionId>;
}
