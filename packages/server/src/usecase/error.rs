//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{DomainError, ErrorCode, RepositoryError, ValueObjectError};

/// Errors of `JoinMatchmakingUseCase`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchmakingError {
    #[error("no room could take the player")]
    RoomUnavailable,

    #[error("invalid reference text: {0}")]
    InvalidReferenceText(#[from] ValueObjectError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for MatchmakingError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Rejected(DomainError::RoomUnavailable) => Self::RoomUnavailable,
            other => Self::Repository(other),
        }
    }
}

/// Errors of `ReportProgressUseCase`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    /// Report arrived while the room or the player is not racing
    #[error("stale progress report")]
    Stale,

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("'{0}' is not playing in this room")]
    NotInRoom(String),

    #[error("insufficient input: {0}")]
    InsufficientInput(String),

    #[error("progress report failed: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ProgressError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(id) => Self::RoomNotFound(id),
            RepositoryError::Rejected(DomainError::StaleProgressReport) => Self::Stale,
            RepositoryError::Rejected(DomainError::InsufficientInput(reason)) => {
                Self::InsufficientInput(reason)
            }
            RepositoryError::Rejected(DomainError::PlayerNotInRoom(user_id)) => {
                Self::NotInRoom(user_id)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Errors of `LeaveRoomUseCase`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    #[error("connection is not in room '{0}'")]
    NotInRoom(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

/// Errors of `GetRoomDetailUseCase`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

impl MatchmakingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomUnavailable => ErrorCode::RoomUnavailable,
            Self::InvalidReferenceText(_) | Self::Repository(_) => ErrorCode::Internal,
        }
    }
}

impl ProgressError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Stale | Self::Internal(_) => ErrorCode::Internal,
            Self::RoomNotFound(_) => ErrorCode::RoomNotFound,
            Self::NotInRoom(_) => ErrorCode::NotInRoom,
            Self::InsufficientInput(_) => ErrorCode::InsufficientInput,
        }
    }
}

impl LeaveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotInRoom(_) => ErrorCode::NotInRoom,
            Self::RoomNotFound(_) => ErrorCode::RoomNotFound,
        }
    }
}
