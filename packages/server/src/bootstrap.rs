//! Dependency wiring.
//!
//! Initialize dependencies in order:
//! 1. Repositories and MessagePusher
//! 2. External collaborators and the result dispatcher
//! 3. Race Coordinator and UseCases
//! 4. AppState

use std::sync::Arc;

use typerace_shared::time::Clock;

use crate::{
    config::RaceConfig,
    domain::ReferenceTextProvider,
    infrastructure::{
        collaborator::{InMemoryGameResultStore, InMemoryUserStatsStore},
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, InMemorySessionRepository},
    },
    ui::AppState,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        JoinMatchmakingUseCase, LeaveRoomUseCase, RaceCoordinator, ReportProgressUseCase,
        ResultDispatcher,
    },
};

/// The wired application plus handles to its in-memory stores
pub struct App {
    pub state: Arc<AppState>,
    pub coordinator: Arc<RaceCoordinator>,
    pub results: Arc<InMemoryGameResultStore>,
    pub user_stats: Arc<InMemoryUserStatsStore>,
}

/// Wire the in-memory implementation. Must be called inside a tokio runtime.
pub fn build_app(
    config: RaceConfig,
    clock: Arc<dyn Clock>,
    texts: Arc<dyn ReferenceTextProvider>,
) -> App {
    // 1. Repositories and MessagePusher
    let rooms = Arc::new(InMemoryRoomRepository::new());
    let sessions = Arc::new(InMemorySessionRepository::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 2. External collaborators
    let results = Arc::new(InMemoryGameResultStore::new());
    let user_stats = Arc::new(InMemoryUserStatsStore::new());
    let dispatcher = ResultDispatcher::spawn(results.clone(), user_stats.clone());

    // 3. Race Coordinator and UseCases
    let coordinator = Arc::new(RaceCoordinator::new(
        rooms.clone(),
        sessions.clone(),
        message_pusher.clone(),
        dispatcher,
        clock,
        config,
    ));

    let state = Arc::new(AppState {
        connect_client_usecase: Arc::new(ConnectClientUseCase::new(message_pusher.clone())),
        disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
            sessions.clone(),
            message_pusher.clone(),
            coordinator.clone(),
        )),
        join_matchmaking_usecase: Arc::new(JoinMatchmakingUseCase::new(
            rooms.clone(),
            sessions.clone(),
            texts,
            coordinator.clone(),
        )),
        report_progress_usecase: Arc::new(ReportProgressUseCase::new(
            sessions.clone(),
            coordinator.clone(),
        )),
        leave_room_usecase: Arc::new(LeaveRoomUseCase::new(sessions, coordinator.clone())),
        get_rooms_usecase: Arc::new(GetRoomsUseCase::new(rooms.clone())),
        get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(rooms)),
    });

    App {
        state,
        coordinator,
        results,
        user_stats,
    }
}
