//! Conversion logic between DTOs and domain entities.

use typerace_shared::time::timestamp_to_rfc3339;

use crate::domain::{ErrorCode, Player, RaceNotice, Room, Standing};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<&Player> for dto::PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            user_id: player.user_id.as_str().to_string(),
            display_name: player.display_name.as_str().to_string(),
            progress: player.progress,
            wpm: player.wpm,
            accuracy: player.accuracy,
            rank: player.rank,
            finished: player.finished,
            finished_at: player.finished_at.map(|t| t.value()),
            connected: player.connected,
        }
    }
}

impl From<&Room> for dto::RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().as_str().to_string(),
            status: room.status(),
            reference_text: room.reference_text().as_str().to_string(),
            capacity: room.capacity(),
            players: room.roster().iter().map(Into::into).collect(),
            created_at: room.created_at().value(),
            started_at: room.started_at().map(|t| t.value()),
            finished_at: room.finished_at().map(|t| t.value()),
            winner_id: room.winner_id().map(|id| id.as_str().to_string()),
        }
    }
}

impl From<&Standing> for dto::ResultEntryDto {
    fn from(standing: &Standing) -> Self {
        Self {
            user_id: standing.user_id.as_str().to_string(),
            display_name: standing.display_name.as_str().to_string(),
            wpm: standing.wpm,
            accuracy: standing.accuracy,
            progress: standing.progress,
            rank: standing.rank,
            finished: standing.finished,
        }
    }
}

fn error_code_str(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::RoomUnavailable => "room_unavailable",
        ErrorCode::RoomNotFound => "room_not_found",
        ErrorCode::InsufficientInput => "insufficient_input",
        ErrorCode::InvalidMessage => "invalid_message",
        ErrorCode::NotInRoom => "not_in_room",
        ErrorCode::Internal => "internal",
    }
}

/// Encode a notice as the JSON text sent over the WebSocket
pub fn encode_notice(notice: &RaceNotice) -> Result<String, serde_json::Error> {
    use dto::MessageType as T;

    match notice {
        RaceNotice::RoomUpdate(room) => serde_json::to_string(&dto::RoomUpdateMessage {
            r#type: T::RoomUpdate,
            room: room.into(),
        }),
        RaceNotice::Countdown { remaining } => serde_json::to_string(&dto::CountdownMessage {
            r#type: T::Countdown,
            n: *remaining,
        }),
        RaceNotice::RaceStarted { text, started_at } => {
            serde_json::to_string(&dto::RaceStartedMessage {
                r#type: T::RaceStarted,
                text: text.clone(),
                started_at: started_at.value(),
            })
        }
        RaceNotice::ProgressUpdate {
            user_id,
            progress,
            wpm,
            accuracy,
            rank,
        } => serde_json::to_string(&dto::ProgressUpdateMessage {
            r#type: T::ProgressUpdate,
            user_id: user_id.as_str().to_string(),
            progress: *progress,
            wpm: *wpm,
            accuracy: *accuracy,
            rank: *rank,
        }),
        RaceNotice::PlayerFinished {
            user_id,
            wpm,
            accuracy,
            rank,
        } => serde_json::to_string(&dto::PlayerFinishedMessage {
            r#type: T::PlayerFinished,
            user_id: user_id.as_str().to_string(),
            wpm: *wpm,
            accuracy: *accuracy,
            rank: *rank,
        }),
        RaceNotice::RaceFinished { winner_id, results } => {
            serde_json::to_string(&dto::RaceFinishedMessage {
                r#type: T::RaceFinished,
                winner_id: winner_id.as_str().to_string(),
                results: results.iter().map(Into::into).collect(),
            })
        }
        RaceNotice::PlayerLeft { user_id } => serde_json::to_string(&dto::PlayerLeftMessage {
            r#type: T::PlayerLeft,
            user_id: user_id.as_str().to_string(),
        }),
        RaceNotice::Error { code, message } => serde_json::to_string(&dto::ErrorMessage {
            r#type: T::Error,
            code: error_code_str(*code).to_string(),
            message: message.clone(),
        }),
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().as_str().to_string(),
            status: room.status(),
            players: room
                .roster()
                .iter()
                .map(|p| p.user_id.as_str().to_string())
                .collect(),
            capacity: room.capacity(),
            created_at: timestamp_to_rfc3339(room.created_at().value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().as_str().to_string(),
            status: room.status(),
            reference_text: room.reference_text().as_str().to_string(),
            capacity: room.capacity(),
            players: room
                .roster()
                .iter()
                .map(|p| http::PlayerDetailDto {
                    user_id: p.user_id.as_str().to_string(),
                    display_name: p.display_name.as_str().to_string(),
                    progress: p.progress,
                    wpm: p.wpm,
                    accuracy: p.accuracy,
                    rank: p.rank,
                    finished: p.finished,
                    connected: p.connected,
                })
                .collect(),
            created_at: timestamp_to_rfc3339(room.created_at().value()),
            started_at: room.started_at().map(|t| timestamp_to_rfc3339(t.value())),
            finished_at: room.finished_at().map(|t| timestamp_to_rfc3339(t.value())),
            winner_id: room.winner_id().map(|id| id.as_str().to_string()),
        }
    }
}
