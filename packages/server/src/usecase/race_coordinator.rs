//! Race Coordinator
//!
//! 部屋の状態遷移をコミットし、その結果（ドメインイベント）を部屋のメンバーへの通知と
//! 副作用（カウントダウンの開始・取り消し、結果の永続化）に変換します。
//!
//! ## 順序保証
//!
//! 変更とその通知は部屋ごとのゲート（`RoomGates`）の中で行われるため、同じ部屋の
//! メンバーには変更が適用された順に通知が届きます。
//!
//! ## カウントダウン
//!
//! 部屋ごとに tokio タスクとして動き、`JoinHandle` を保持します。カウントダウン中に
//! 定員割れした場合はタスクを abort します。

use std::{collections::HashMap, sync::Arc};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::{sync::Mutex, task::JoinHandle};
use typerace_shared::time::Clock;

use crate::{
    config::RaceConfig,
    domain::{
        ConnectionId, MessagePusher, MutationOutcome, RaceNotice, RepositoryError, Room,
        RoomEvent, RoomId, RoomMutation, RoomRepository, RoomStatus, Session, SessionRepository,
        Timestamp, UserId,
    },
    usecase::{dispatcher::ResultDispatcher, gate::RoomGates},
};

pub struct RaceCoordinator {
    rooms: Arc<dyn RoomRepository>,
    sessions: Arc<dyn SessionRepository>,
    pusher: Arc<dyn MessagePusher>,
    dispatcher: ResultDispatcher,
    clock: Arc<dyn Clock>,
    config: RaceConfig,
    gates: RoomGates,
    countdowns: Mutex<HashMap<RoomId, JoinHandle<()>>>,
}

impl RaceCoordinator {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        sessions: Arc<dyn SessionRepository>,
        pusher: Arc<dyn MessagePusher>,
        dispatcher: ResultDispatcher,
        clock: Arc<dyn Clock>,
        config: RaceConfig,
    ) -> Self {
        Self {
            rooms,
            sessions,
            pusher,
            dispatcher,
            clock,
            config,
            gates: RoomGates::new(),
            countdowns: Mutex::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &ResultDispatcher {
        &self.dispatcher
    }

    /// Take the sequencing gate of a room.
    ///
    /// Callers that need to do more than [`Self::apply`] between the mutation
    /// and its notices (matchmaking binds the session first) hold the gate
    /// themselves and call `mutate` + [`Self::publish`].
    pub async fn lock_room(&self, room_id: &RoomId) -> tokio::sync::OwnedMutexGuard<()> {
        self.gates.acquire(room_id).await
    }

    /// Mutate a room and deliver the resulting notices, in one gated step
    pub async fn apply(
        self: &Arc<Self>,
        room_id: &RoomId,
        mutation: RoomMutation,
    ) -> Result<MutationOutcome, RepositoryError> {
        let _gate = self.gates.acquire(room_id).await;
        self.commit(room_id, mutation).await
    }

    /// Caller must hold the room's gate
    async fn commit(
        self: &Arc<Self>,
        room_id: &RoomId,
        mutation: RoomMutation,
    ) -> Result<MutationOutcome, RepositoryError> {
        let outcome = self.rooms.mutate(room_id, mutation).await?;
        self.publish(&outcome).await;
        Ok(outcome)
    }

    /// Turn the events of a committed mutation into notices and side effects.
    ///
    /// Caller must hold the room's gate.
    pub async fn publish(self: &Arc<Self>, outcome: &MutationOutcome) {
        let room = &outcome.room;
        if outcome.events.is_empty() {
            return;
        }
        let targets = self.sessions.connections_in_room(room.id()).await;

        for event in &outcome.events {
            match event {
                RoomEvent::PlayerJoined { user_id } => {
                    tracing::info!(
                        "Player '{}' joined room '{}' ({}/{})",
                        user_id,
                        room.id(),
                        room.roster().len(),
                        room.capacity()
                    );
                    self.send(&targets, &RaceNotice::RoomUpdate(room.clone()))
                        .await;
                }
                RoomEvent::CountdownArmed => {
                    tracing::info!("Room '{}' is full, countdown armed", room.id());
                    self.schedule_countdown(room.id().clone()).await;
                }
                RoomEvent::CountdownCancelled => {
                    tracing::info!("Countdown of room '{}' cancelled", room.id());
                    self.cancel_countdown(room.id()).await;
                }
                RoomEvent::RaceStarted { started_at } => {
                    tracing::info!("Race started in room '{}'", room.id());
                    let notice = RaceNotice::RaceStarted {
                        text: room.reference_text().as_str().to_string(),
                        started_at: *started_at,
                    };
                    self.send(&targets, &notice).await;
                }
                RoomEvent::ProgressRecorded {
                    user_id,
                    progress,
                    wpm,
                    accuracy,
                    rank,
                } => {
                    let notice = RaceNotice::ProgressUpdate {
                        user_id: user_id.clone(),
                        progress: *progress,
                        wpm: *wpm,
                        accuracy: *accuracy,
                        rank: *rank,
                    };
                    self.send(&targets, &notice).await;
                }
                RoomEvent::PlayerFinished(record) => {
                    tracing::info!(
                        "Player '{}' finished in room '{}' (wpm: {:.1}, rank: {})",
                        record.user_id,
                        room.id(),
                        record.wpm,
                        record.finish_position
                    );
                    let notice = RaceNotice::PlayerFinished {
                        user_id: record.user_id.clone(),
                        wpm: record.wpm,
                        accuracy: record.accuracy,
                        rank: record.finish_position,
                    };
                    self.send(&targets, &notice).await;
                    self.dispatcher.record_finish(record.clone());
                }
                RoomEvent::RaceFinished { winner_id } => {
                    tracing::info!("Race finished in room '{}', winner '{}'", room.id(), winner_id);
                    let notice = RaceNotice::RaceFinished {
                        winner_id: winner_id.clone(),
                        results: room.standings(),
                    };
                    self.send(&targets, &notice).await;
                    self.confirm_winner(outcome, room, winner_id);
                }
                RoomEvent::PlayerLeft { user_id } => {
                    tracing::info!("Player '{}' left room '{}'", user_id, room.id());
                    self.send(&targets, &RaceNotice::PlayerLeft {
                        user_id: user_id.clone(),
                    })
                    .await;
                    if room.status() == RoomStatus::Waiting {
                        self.send(&targets, &RaceNotice::RoomUpdate(room.clone()))
                            .await;
                    }
                }
            }
        }
    }

    /// The winner's result is stored as a winner exactly once: either their own
    /// finish closed the race, or it is re-recorded here.
    fn confirm_winner(&self, outcome: &MutationOutcome, room: &Room, winner_id: &UserId) {
        let already_recorded = outcome.events.iter().any(|event| {
            matches!(event, RoomEvent::PlayerFinished(record)
                if &record.user_id == winner_id && record.is_winner)
        });
        if already_recorded {
            return;
        }
        match room.finish_record(winner_id, true) {
            Some(record) => self.dispatcher.confirm_winner(record),
            None => tracing::error!(
                "Winner '{}' of room '{}' has no finish record",
                winner_id,
                room.id()
            ),
        }
    }

    /// Remove a player from the room of `session` and tell the others.
    ///
    /// The session is unbound first so the departing connection receives no
    /// further notices of that room.
    pub async fn depart(
        self: &Arc<Self>,
        session: Session,
    ) -> Result<MutationOutcome, RepositoryError> {
        let _gate = self.gates.acquire(&session.room_id).await;
        self.sessions.unbind(&session.connection_id).await;
        self.remove_player(&session.room_id, session.user_id).await
    }

    /// Remove a player whose session was already replaced by another binding.
    ///
    /// Unlike [`Self::depart`] no session is touched: the connection may now
    /// belong to someone else.
    pub async fn evict_player(
        self: &Arc<Self>,
        room_id: &RoomId,
        user_id: UserId,
    ) -> Result<MutationOutcome, RepositoryError> {
        let _gate = self.gates.acquire(room_id).await;
        self.remove_player(room_id, user_id).await
    }

    /// Caller must hold the room's gate
    async fn remove_player(
        self: &Arc<Self>,
        room_id: &RoomId,
        user_id: UserId,
    ) -> Result<MutationOutcome, RepositoryError> {
        let clock = self.clock();
        let outcome = self
            .commit(
                room_id,
                Box::new(move |room| {
                    room.remove_player(&user_id, Timestamp::new(clock.now_millis()))
                }),
            )
            .await?;
        self.reclaim_if_done(&outcome.room).await;
        Ok(outcome)
    }

    /// A finished room nobody is bound to any more leaves memory.
    ///
    /// Caller must hold the room's gate.
    async fn reclaim_if_done(&self, room: &Room) {
        if room.status() != RoomStatus::Finished {
            return;
        }
        if !self.sessions.connections_in_room(room.id()).await.is_empty() {
            return;
        }
        match self.rooms.remove(room.id()).await {
            Ok(_) => {
                self.gates.release(room.id()).await;
                tracing::info!("Room '{}' released", room.id());
            }
            Err(e) => tracing::warn!("Room '{}' could not be released: {}", room.id(), e),
        }
    }

    /// Send a notice to every connection currently bound to a room
    pub async fn broadcast_room(&self, room_id: &RoomId, notice: &RaceNotice) {
        let targets = self.sessions.connections_in_room(room_id).await;
        self.send(&targets, notice).await;
    }

    /// Send a notice to one connection
    pub async fn send_to(&self, connection_id: &ConnectionId, notice: &RaceNotice) {
        if let Err(e) = self.pusher.push_to(connection_id, notice).await {
            tracing::warn!("Failed to push to '{}': {}", connection_id, e);
        }
    }

    async fn send(&self, targets: &[ConnectionId], notice: &RaceNotice) {
        if let Err(e) = self.pusher.broadcast(targets.to_vec(), notice).await {
            tracing::warn!("Broadcast failed: {}", e);
        }
    }

    async fn schedule_countdown(self: &Arc<Self>, room_id: RoomId) {
        let task = Arc::clone(self).run_countdown(room_id.clone());
        let handle = tokio::spawn(task);
        if let Some(previous) = self.countdowns.lock().await.insert(room_id, handle) {
            previous.abort();
        }
    }

    async fn cancel_countdown(&self, room_id: &RoomId) {
        if let Some(handle) = self.countdowns.lock().await.remove(room_id) {
            handle.abort();
        }
    }

    /// Tick `countdown_from..=0` and then start the race.
    ///
    /// Each tick re-checks under the gate that the room is still counting down.
    fn run_countdown(self: Arc<Self>, room_id: RoomId) -> BoxFuture<'static, ()> {
        async move {
            let interval = self.config.countdown_interval;
            for remaining in (0..=self.config.countdown_from).rev() {
                tokio::time::sleep(interval).await;
                let _gate = self.gates.acquire(&room_id).await;
                if !self.still_counting(&room_id).await {
                    return;
                }
                self.broadcast_room(&room_id, &RaceNotice::Countdown { remaining })
                    .await;
            }

            let _gate = self.gates.acquire(&room_id).await;
            self.countdowns.lock().await.remove(&room_id);
            if !self.still_counting(&room_id).await {
                return;
            }
            let now = self.now();
            if let Err(e) = self
                .commit(&room_id, Box::new(move |room| room.start_race(now)))
                .await
            {
                tracing::error!("Failed to start race in room '{}': {}", room_id, e);
            }
        }
        .boxed()
    }

    async fn still_counting(&self, room_id: &RoomId) -> bool {
        match self.rooms.get(room_id).await {
            Ok(room) => room.status() == RoomStatus::Countdown,
            Err(e) => {
                tracing::warn!("Countdown of room '{}' stopped: {}", room_id, e);
                false
            }
        }
    }

    /// Number of countdowns currently scheduled
    pub async fn pending_countdowns(&self) -> usize {
        self.countdowns.lock().await.len()
    }

    /// Number of rooms holding a sequencing gate
    pub async fn gated_rooms(&self) -> usize {
        self.gates.len().await
    }
}
