//! Outbound notices delivered to the members of a room.
//!
//! The transport decides how a notice is encoded; see
//! `infrastructure::dto::websocket` for the JSON form.

use super::{
    entity::{Room, Standing},
    value_object::{Timestamp, UserId},
};

/// Reason codes for errors sent back to a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    RoomUnavailable,
    RoomNotFound,
    InsufficientInput,
    InvalidMessage,
    NotInRoom,
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RaceNotice {
    RoomUpdate(Room),
    Countdown {
        remaining: u32,
    },
    RaceStarted {
        text: String,
        started_at: Timestamp,
    },
    ProgressUpdate {
        user_id: UserId,
        progress: f64,
        wpm: f64,
        accuracy: f64,
        rank: usize,
    },
    PlayerFinished {
        user_id: UserId,
        wpm: f64,
        accuracy: f64,
        rank: usize,
    },
    RaceFinished {
        winner_id: UserId,
        results: Vec<Standing>,
    },
    PlayerLeft {
        user_id: UserId,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}
