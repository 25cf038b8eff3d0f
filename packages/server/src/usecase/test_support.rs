//! Shared fixture for the use case tests: in-memory infrastructure, a manual
//! clock and a fast countdown.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::sync::mpsc;
use typerace_shared::time::{Clock, ManualClock};

use crate::{
    config::RaceConfig,
    domain::{
        ConnectionId, ConnectionIdFactory, DisplayName, MessagePusher, MutationOutcome,
        ReferenceText, RepositoryError, Room, RoomId, RoomRepository, RoomStatus,
        SessionRepository, Timestamp, UserId,
    },
    infrastructure::{
        collaborator::{InMemoryGameResultStore, InMemoryUserStatsStore, RandomTextPool},
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, InMemorySessionRepository},
    },
    usecase::{RaceCoordinator, ResultDispatcher},
};

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub rooms: Arc<InMemoryRoomRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub results: Arc<InMemoryGameResultStore>,
    pub user_stats: Arc<InMemoryUserStatsStore>,
    pub texts: Arc<RandomTextPool>,
    pub clock: Arc<ManualClock>,
    pub coordinator: Arc<RaceCoordinator>,
}

impl Harness {
    pub fn new(capacity: usize) -> Self {
        Self::with_countdown(capacity, 1, Duration::from_millis(10))
    }

    pub fn with_countdown(capacity: usize, from: u32, interval: Duration) -> Self {
        Self::with_text(capacity, from, interval, "cat dog")
    }

    pub fn with_text(capacity: usize, from: u32, interval: Duration, text: &str) -> Self {
        let config = RaceConfig::default()
            .with_room_capacity(capacity)
            .with_countdown(from, interval);
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let results = Arc::new(InMemoryGameResultStore::new());
        let user_stats = Arc::new(InMemoryUserStatsStore::new());
        let texts = Arc::new(RandomTextPool::new(vec![text.to_string()]));
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let dispatcher = ResultDispatcher::spawn(results.clone(), user_stats.clone());
        let coordinator = Arc::new(RaceCoordinator::new(
            rooms.clone(),
            sessions.clone(),
            pusher.clone(),
            dispatcher,
            clock.clone(),
            config,
        ));
        Self {
            rooms,
            sessions,
            pusher,
            results,
            user_stats,
            texts,
            clock,
            coordinator,
        }
    }

    /// Register a fresh connection with the pusher
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionIdFactory::generate().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(connection_id.clone(), tx).await;
        (connection_id, rx)
    }

    pub async fn create_room(&self, text: &str) -> Room {
        self.rooms
            .create(
                ReferenceText::new(text.to_string()).unwrap(),
                self.coordinator.config().room_capacity,
                Timestamp::new(self.clock.now_millis()),
            )
            .await
            .unwrap()
    }

    /// Seat a player through a fresh connection, the way matchmaking does
    pub async fn seat(
        &self,
        room_id: &RoomId,
        id: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (connection_id, rx) = self.connect().await;
        let user_id = UserId::new(id.to_string()).unwrap();
        let name = DisplayName::new(id.to_uppercase()).unwrap();

        let _gate = self.coordinator.lock_room(room_id).await;
        let joining = user_id.clone();
        let outcome = self
            .rooms
            .mutate(room_id, Box::new(move |room| room.add_player(joining, name)))
            .await
            .unwrap();
        self.sessions
            .bind(connection_id.clone(), user_id, room_id.clone())
            .await;
        self.coordinator.publish(&outcome).await;
        (connection_id, rx)
    }

    /// Create a room, fill it and wait for the countdown to start the race
    pub async fn start_race(&self, users: &[&str], text: &str) -> Room {
        let room = self.create_room(text).await;
        for id in users {
            self.seat(room.id(), id).await;
        }
        self.wait_for_status(room.id(), RoomStatus::InProgress).await
    }

    pub async fn wait_for_status(&self, room_id: &RoomId, status: RoomStatus) -> Room {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        loop {
            let room = self.rooms.get(room_id).await.unwrap();
            if room.status() == status {
                return room;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "room never reached {:?}",
                status
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Apply one progress report at the current manual time
    pub async fn report(
        &self,
        room_id: &RoomId,
        user: &str,
        text: &str,
        char_index: i64,
    ) -> Result<MutationOutcome, RepositoryError> {
        let user_id = UserId::new(user.to_string()).unwrap();
        let text = text.to_string();
        let now = self.coordinator.now();
        self.coordinator
            .apply(
                room_id,
                Box::new(move |room| room.record_progress(&user_id, &text, char_index, now)),
            )
            .await
    }

    /// Receive messages until one of type `until` arrives
    pub async fn collect_until(
        rx: &mut mpsc::UnboundedReceiver<String>,
        until: &str,
    ) -> Vec<Value> {
        let mut messages = Vec::new();
        loop {
            let raw = tokio::time::timeout(Duration::from_secs(3), rx.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for '{}'", until))
                .expect("channel closed");
            let message: Value = serde_json::from_str(&raw).unwrap();
            let done = message["type"] == until;
            messages.push(message);
            if done {
                return messages;
            }
        }
    }

    /// Messages already queued on a connection
    pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            messages.push(serde_json::from_str(&raw).unwrap());
        }
        messages
    }

    pub fn types(messages: &[Value]) -> Vec<String> {
        messages
            .iter()
            .map(|m| m["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}
