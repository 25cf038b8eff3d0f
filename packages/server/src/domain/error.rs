//! Domain layer errors.

use thiserror::Error;

use super::entity::RoomStatus;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Rule violations raised by `Room` state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Join attempted against a full or non-waiting room
    #[error("room is full or no longer accepting players")]
    RoomUnavailable,

    /// Progress arrived for a room (or player) that is not racing
    #[error("progress report is stale")]
    StaleProgressReport,

    /// Malformed progress report
    #[error("insufficient input: {0}")]
    InsufficientInput(String),

    #[error("player '{0}' is not in this room")]
    PlayerNotInRoom(String),

    #[error("cannot move room from {from:?} to {to:?}")]
    InvalidTransition { from: RoomStatus, to: RoomStatus },
}

/// Stats calculator input errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("elapsed time must not be negative (got {0}s)")]
    NegativeElapsed(f64),
}

/// Room / session directory errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    /// The mutation refused to apply; the stored room is unchanged
    #[error("mutation rejected: {0}")]
    Rejected(#[from] DomainError),

    /// The mutation panicked; the stored room is unchanged
    #[error("mutation panicked: {0}")]
    MutationPanicked(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValueObjectError),
}

/// Message delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Failures reported by the external persistence collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
