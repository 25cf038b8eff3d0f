//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::RoomStatus;

/// Room summary for `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub status: RoomStatus,
    pub players: Vec<String>,
    pub capacity: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetailDto {
    pub user_id: String,
    pub display_name: String,
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub rank: usize,
    pub finished: bool,
    pub connected: bool,
}

/// Room detail for `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub status: RoomStatus,
    pub reference_text: String,
    pub capacity: usize,
    pub players: Vec<PlayerDetailDto>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub winner_id: Option<String>,
}
