//! Domain events emitted by `Room` mutations.
//!
//! A mutation returns the events it caused, in the order they happened. The
//! coordinator turns them into notices and side effects after the mutation has
//! been committed.

use super::value_object::{RoomId, Timestamp, UserId};

/// Everything the external result sink needs about one finisher
#[derive(Debug, Clone, PartialEq)]
pub struct FinishRecord {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub wpm: f64,
    pub accuracy: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
    pub time_taken_seconds: f64,
    pub finish_position: usize,
    pub is_winner: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    PlayerJoined {
        user_id: UserId,
    },
    /// Roster reached capacity; a countdown must be scheduled
    CountdownArmed,
    /// Roster shrank during the countdown; the pending countdown must be cancelled
    CountdownCancelled,
    RaceStarted {
        started_at: Timestamp,
    },
    ProgressRecorded {
        user_id: UserId,
        progress: f64,
        wpm: f64,
        accuracy: f64,
        rank: usize,
    },
    PlayerFinished(FinishRecord),
    RaceFinished {
        winner_id: UserId,
    },
    PlayerLeft {
        user_id: UserId,
    },
}
