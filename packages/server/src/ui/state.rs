//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
    JoinMatchmakingUseCase, LeaveRoomUseCase, ReportProgressUseCase,
};

/// Use cases reachable from the handlers
pub struct AppState {
    /// 接続（ConnectionId の払い出しと送信チャネルの登録）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// 切断（部屋からの退出を含む）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub join_matchmaking_usecase: Arc<JoinMatchmakingUseCase>,
    pub report_progress_usecase: Arc<ReportProgressUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
