//! Contracts of the external persistence collaborators.
//!
//! Durable storage of users and game results lives outside the race core. The
//! core only talks to these traits.

use async_trait::async_trait;

use super::{CollaboratorError, FinishRecord, UserId};

/// Game Result Sink
///
/// Expected to be idempotent per `(user_id, room_id)`: recording the same pair
/// again replaces the earlier row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameResultSink: Send + Sync {
    async fn record_result(&self, result: FinishRecord) -> Result<(), CollaboratorError>;
}

/// User Stats Updater
///
/// `update_stats` folds one game into the user's rolling averages:
/// `new_avg = (old_avg * old_games + value) / (old_games + 1)` for both WPM and
/// accuracy, with `best_wpm = max(best_wpm, wpm)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatsUpdater: Send + Sync {
    async fn update_stats(
        &self,
        user_id: &UserId,
        wpm: f64,
        accuracy: f64,
        is_winner: bool,
    ) -> Result<(), CollaboratorError>;

    /// Credit a win for a game whose stats were already folded in
    async fn record_win(&self, user_id: &UserId) -> Result<(), CollaboratorError>;
}

/// Reference Text Provider
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceTextProvider: Send + Sync {
    fn next_text(&self) -> String;
}
