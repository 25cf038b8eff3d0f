//! WebSocket message DTOs.
//!
//! Every message is a JSON object with a `type` field.

use serde::{Deserialize, Serialize};

use crate::domain::RoomStatus;

/// Messages sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinMatchmaking {
        user_id: String,
        display_name: String,
    },
    LeaveRoom {
        room_id: String,
    },
    TypingProgress {
        room_id: String,
        user_id: String,
        submitted_text: String,
        char_index: i64,
    },
}

/// `type` tag of server messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    RoomUpdate,
    Countdown,
    RaceStarted,
    ProgressUpdate,
    PlayerFinished,
    RaceFinished,
    PlayerLeft,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDto {
    pub user_id: String,
    pub display_name: String,
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub rank: usize,
    pub finished: bool,
    pub finished_at: Option<i64>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: String,
    pub status: RoomStatus,
    pub reference_text: String,
    pub capacity: usize,
    pub players: Vec<PlayerDto>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub winner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUpdateMessage {
    pub r#type: MessageType,
    pub room: RoomDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownMessage {
    pub r#type: MessageType,
    pub n: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceStartedMessage {
    pub r#type: MessageType,
    pub text: String,
    pub started_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdateMessage {
    pub r#type: MessageType,
    pub user_id: String,
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFinishedMessage {
    pub r#type: MessageType,
    pub user_id: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntryDto {
    pub user_id: String,
    pub display_name: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub progress: f64,
    pub rank: usize,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceFinishedMessage {
    pub r#type: MessageType,
    pub winner_id: String,
    pub results: Vec<ResultEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeftMessage {
    pub r#type: MessageType,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub code: String,
    pub message: String,
}
