//! UseCase layer
//!
//! 受信メッセージ・HTTP リクエストごとのユースケースと、それらが共有する
//! Race Coordinator（状態遷移の適用と通知）。

pub mod connect_client;
pub mod disconnect_client;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_matchmaking;
pub mod leave_room;
pub mod race_coordinator;
pub mod report_progress;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use dispatcher::ResultDispatcher;
pub use error::{GetRoomDetailError, LeaveError, MatchmakingError, ProgressError};
pub use gate::RoomGates;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_matchmaking::JoinMatchmakingUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use race_coordinator::RaceCoordinator;
pub use report_progress::{ProgressReport, ReportProgressUseCase};
