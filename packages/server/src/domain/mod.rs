//! Domain layer
//!
//! レースの状態機械と、それを支える値オブジェクト・イベント・インターフェース。
//! 外部クレートの I/O には依存しません。

pub mod collaborator;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod message_pusher;
pub mod notice;
pub mod repository;
pub mod stats;
pub mod value_object;

pub use collaborator::{GameResultSink, ReferenceTextProvider, UserStatsUpdater};
pub use entity::{Player, Room, RoomStatus, Standing};
pub use error::{
    CollaboratorError, DomainError, MessagePushError, RepositoryError, StatsError,
    ValueObjectError,
};
pub use event::{FinishRecord, RoomEvent};
pub use factory::{ConnectionIdFactory, RoomIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notice::{ErrorCode, RaceNotice};
pub use repository::{
    MutationOutcome, RoomMutation, RoomRepository, Session, SessionRepository,
};
pub use stats::{TypingStats, calculate_stats};
pub use value_object::{ConnectionId, DisplayName, ReferenceText, RoomId, Timestamp, UserId};
