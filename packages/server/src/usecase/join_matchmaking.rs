//! UseCase: マッチメイキング（部屋への参加）
//!
//! 最も古い「待機中かつ空きあり」の部屋に参加させ、無ければ新しい部屋を作ります。
//! 部屋の検索と参加の間に他のプレイヤーが割り込むことがあるため、参加が
//! `RoomUnavailable` で拒否された場合は別の部屋で再試行します。

use std::sync::Arc;

use crate::{
    domain::{
        ConnectionId, DisplayName, DomainError, MutationOutcome, RaceNotice, ReferenceText,
        ReferenceTextProvider, RepositoryError, Room, RoomId, RoomRepository, RoomStatus,
        SessionRepository, UserId,
    },
    usecase::{error::MatchmakingError, race_coordinator::RaceCoordinator},
};

/// マッチメイキングのユースケース
pub struct JoinMatchmakingUseCase {
    rooms: Arc<dyn RoomRepository>,
    sessions: Arc<dyn SessionRepository>,
    texts: Arc<dyn ReferenceTextProvider>,
    coordinator: Arc<RaceCoordinator>,
}

impl JoinMatchmakingUseCase {
    /// 新しい JoinMatchmakingUseCase を作成
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        sessions: Arc<dyn SessionRepository>,
        texts: Arc<dyn ReferenceTextProvider>,
        coordinator: Arc<RaceCoordinator>,
    ) -> Self {
        Self {
            rooms,
            sessions,
            texts,
            coordinator,
        }
    }

    /// Seat the player of `connection_id` in a room.
    ///
    /// A player already waiting in a room stays there. A player bound to a
    /// room that is racing or finished leaves it first. A connection that was
    /// playing as another user leaves that user's room first.
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加要求を送った接続
    /// * `user_id` - 参加するユーザー
    /// * `display_name` - 部屋のメンバーに表示される名前
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 参加した部屋のスナップショット
    /// * `Err(MatchmakingError)` - どの部屋にも参加できなかった
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
    ) -> Result<Room, MatchmakingError> {
        if let Some(session) = self.sessions.find_by_connection(&connection_id).await {
            if session.user_id != user_id {
                tracing::info!(
                    "Connection '{}' switches from '{}' to '{}'",
                    connection_id,
                    session.user_id,
                    user_id
                );
                if let Err(e) = self.coordinator.depart(session).await {
                    tracing::debug!("Previous user of '{}' not removed: {}", connection_id, e);
                }
            }
        }

        if let Some(session) = self.sessions.find_by_user(&user_id).await {
            if self.still_waiting_in(&session.room_id, &user_id).await {
                let room_id = session.room_id.clone();
                return self
                    .join_room(&room_id, connection_id, user_id, display_name)
                    .await;
            }
            if let Err(e) = self.coordinator.depart(session).await {
                tracing::debug!("Previous room of '{}' not left cleanly: {}", user_id, e);
            }
        }

        let attempts = self.coordinator.config().join_attempts.max(1);
        for attempt in 1..=attempts {
            let room_id = match self.rooms.find_open_waiting_room().await {
                Some(room) => room.id().clone(),
                None => self.create_room().await?.id().clone(),
            };

            match self
                .join_room(
                    &room_id,
                    connection_id.clone(),
                    user_id.clone(),
                    display_name.clone(),
                )
                .await
            {
                Ok(room) => return Ok(room),
                Err(MatchmakingError::RoomUnavailable) => {
                    tracing::warn!(
                        "Room '{}' became unavailable for '{}' (attempt {}/{})",
                        room_id,
                        user_id,
                        attempt,
                        attempts
                    );
                }
                Err(MatchmakingError::Repository(RepositoryError::RoomNotFound(_))) => {
                    tracing::warn!("Room '{}' disappeared during matchmaking", room_id);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!("No room could take '{}'", user_id);
        Err(MatchmakingError::RoomUnavailable)
    }

    /// Seat a player in one specific room.
    ///
    /// Fails with `RoomUnavailable` when the room is full or no longer waiting,
    /// unless the player is still racing in it: then only the connection is
    /// rebound. Players whose bindings were taken over by this one are removed
    /// from their rooms.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
    ) -> Result<Room, MatchmakingError> {
        let gate = self.coordinator.lock_room(room_id).await;

        let joining = user_id.clone();
        let outcome = match self
            .rooms
            .mutate(
                room_id,
                Box::new(move |room| room.add_player(joining, display_name)),
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(RepositoryError::Rejected(DomainError::RoomUnavailable)) => {
                let room = self.rooms.get(room_id).await?;
                if !still_racing_in(&room, &user_id) {
                    return Err(MatchmakingError::RoomUnavailable);
                }
                tracing::info!("'{}' rejoined the race in room '{}'", user_id, room_id);
                MutationOutcome {
                    room,
                    events: Vec::new(),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let orphaned: Vec<_> = self
            .sessions
            .bind(connection_id.clone(), user_id.clone(), room_id.clone())
            .await
            .into_iter()
            .filter(|session| session.user_id != user_id || &session.room_id != room_id)
            .collect();

        if outcome.events.is_empty() {
            // already seated: only the rejoining connection needs the snapshot
            self.coordinator
                .send_to(&connection_id, &RaceNotice::RoomUpdate(outcome.room.clone()))
                .await;
        } else {
            self.coordinator.publish(&outcome).await;
        }
        drop(gate);

        for session in orphaned {
            tracing::info!(
                "'{}' lost connection '{}' and leaves room '{}'",
                session.user_id,
                session.connection_id,
                session.room_id
            );
            if let Err(e) = self
                .coordinator
                .evict_player(&session.room_id, session.user_id)
                .await
            {
                tracing::debug!("Eviction from room '{}' changed nothing: {}", session.room_id, e);
            }
        }
        Ok(outcome.room)
    }

    async fn create_room(&self) -> Result<Room, MatchmakingError> {
        let text = ReferenceText::new(self.texts.next_text())?;
        let room = self
            .rooms
            .create(
                text,
                self.coordinator.config().room_capacity,
                self.coordinator.now(),
            )
            .await?;
        tracing::info!("Created room '{}'", room.id());
        Ok(room)
    }

    async fn still_waiting_in(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        match self.rooms.get(room_id).await {
            Ok(room) => {
                room.player(user_id).is_some()
                    && matches!(room.status(), RoomStatus::Waiting | RoomStatus::Countdown)
            }
            Err(_) => false,
        }
    }
}

/// Seated, connected and the race is on
fn still_racing_in(room: &Room, user_id: &UserId) -> bool {
    room.status() == RoomStatus::InProgress && room.player(user_id).is_some_and(|p| p.connected)
}
