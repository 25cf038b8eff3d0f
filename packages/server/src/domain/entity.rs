//! Race entities: `Room` and the `Player` snapshots on its roster.
//!
//! `Room` owns every lifecycle rule. Each mutating method either applies a
//! complete transition and returns the resulting events, or returns an error;
//! callers apply mutations to a draft copy so an error never leaves a partially
//! updated room behind.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{
    error::DomainError,
    event::{FinishRecord, RoomEvent},
    stats::calculate_stats,
    value_object::{DisplayName, ReferenceText, RoomId, Timestamp, UserId},
};

/// Room lifecycle. Moves strictly forward, except that a cancelled countdown
/// returns the room to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Countdown,
    InProgress,
    Finished,
}

impl RoomStatus {
    fn can_move_to(self, next: RoomStatus) -> bool {
        use RoomStatus::*;
        matches!(
            (self, next),
            (Waiting, Countdown)
                | (Countdown, Waiting)
                | (Countdown, InProgress)
                | (InProgress, Finished)
        )
    }
}

/// A racer's live state inside one room
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub user_id: UserId,
    pub display_name: DisplayName,
    /// Percentage of the reference text consumed; never decreases
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    /// 1-based live ordering
    pub rank: usize,
    pub finished: bool,
    pub finished_at: Option<Timestamp>,
    /// False once the player disconnected mid-race; their last state is kept
    pub connected: bool,
}

impl Player {
    fn new(user_id: UserId, display_name: DisplayName, rank: usize) -> Self {
        Self {
            user_id,
            display_name,
            progress: 0.0,
            wpm: 0.0,
            accuracy: 100.0,
            correct_chars: 0,
            incorrect_chars: 0,
            rank,
            finished: false,
            finished_at: None,
            connected: true,
        }
    }

    /// Still able to report progress
    fn is_racing(&self) -> bool {
        self.connected && !self.finished
    }
}

/// One row of the final results summary
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub wpm: f64,
    pub accuracy: f64,
    pub progress: f64,
    pub rank: usize,
    pub finished: bool,
}

/// One race instance
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    id: RoomId,
    status: RoomStatus,
    reference_text: ReferenceText,
    roster: Vec<Player>,
    capacity: usize,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    finished_at: Option<Timestamp>,
    winner_id: Option<UserId>,
}

impl Room {
    /// Create an empty room in `Waiting`. A capacity of zero is raised to one.
    pub fn new(
        id: RoomId,
        reference_text: ReferenceText,
        capacity: usize,
        created_at: Timestamp,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            id,
            status: RoomStatus::Waiting,
            reference_text,
            roster: Vec::with_capacity(capacity),
            capacity,
            created_at,
            started_at: None,
            finished_at: None,
            winner_id: None,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn reference_text(&self) -> &ReferenceText {
        &self.reference_text
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn winner_id(&self) -> Option<&UserId> {
        self.winner_id.as_ref()
    }

    pub fn player(&self, user_id: &UserId) -> Option<&Player> {
        self.roster.iter().find(|p| &p.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.capacity
    }

    /// `Waiting` with a free seat
    pub fn is_open(&self) -> bool {
        self.status == RoomStatus::Waiting && !self.is_full()
    }

    /// Append a player. Arms the countdown when the roster fills up.
    ///
    /// Joining a room the player is already waiting in is a no-op.
    pub fn add_player(
        &mut self,
        user_id: UserId,
        display_name: DisplayName,
    ) -> Result<Vec<RoomEvent>, DomainError> {
        let already_seated = self.player(&user_id).is_some();
        if already_seated
            && matches!(self.status, RoomStatus::Waiting | RoomStatus::Countdown)
        {
            return Ok(Vec::new());
        }
        if self.status != RoomStatus::Waiting || self.is_full() || already_seated {
            return Err(DomainError::RoomUnavailable);
        }

        let rank = self.roster.len() + 1;
        self.roster
            .push(Player::new(user_id.clone(), display_name, rank));
        let mut events = vec![RoomEvent::PlayerJoined { user_id }];

        if self.is_full() {
            self.transition(RoomStatus::Countdown)?;
            events.push(RoomEvent::CountdownArmed);
        }
        Ok(events)
    }

    /// Countdown finished: the race begins now.
    pub fn start_race(&mut self, now: Timestamp) -> Result<Vec<RoomEvent>, DomainError> {
        self.transition(RoomStatus::InProgress)?;
        self.started_at = Some(now);
        Ok(vec![RoomEvent::RaceStarted { started_at: now }])
    }

    /// Apply one progress report.
    ///
    /// Updates the reporter's metrics, re-ranks the roster, and, when the
    /// report reaches the end of the text, finishes the player and possibly the
    /// whole race, all in one step.
    pub fn record_progress(
        &mut self,
        user_id: &UserId,
        submitted_text: &str,
        char_index: i64,
        now: Timestamp,
    ) -> Result<Vec<RoomEvent>, DomainError> {
        if self.status != RoomStatus::InProgress {
            return Err(DomainError::StaleProgressReport);
        }
        let started_at = self.started_at.ok_or(DomainError::StaleProgressReport)?;

        let char_index = usize::try_from(char_index).map_err(|_| {
            DomainError::InsufficientInput("char_index must not be negative".to_string())
        })?;
        let text_len = self.reference_text.char_len();
        if submitted_text.chars().count() > text_len {
            return Err(DomainError::InsufficientInput(
                "submitted text is longer than the reference text".to_string(),
            ));
        }

        let idx = self.index_of(user_id)?;
        if !self.roster[idx].is_racing() {
            return Err(DomainError::StaleProgressReport);
        }

        let stats = calculate_stats(
            self.reference_text.as_str(),
            submitted_text,
            now.seconds_since(started_at),
        )
        .map_err(|e| DomainError::InsufficientInput(e.to_string()))?;

        let reached_end = char_index >= text_len;
        let progress = 100.0 * char_index.min(text_len) as f64 / text_len as f64;
        {
            let player = &mut self.roster[idx];
            player.progress = player.progress.max(progress);
            player.wpm = stats.wpm;
            player.accuracy = stats.accuracy;
            player.correct_chars = stats.correct_chars;
            player.incorrect_chars = stats.incorrect_chars;
            if reached_end {
                player.finished = true;
                player.finished_at = Some(now);
            }
        }
        self.recompute_ranks();

        let player = &self.roster[idx];
        let mut events = vec![RoomEvent::ProgressRecorded {
            user_id: user_id.clone(),
            progress: player.progress,
            wpm: player.wpm,
            accuracy: player.accuracy,
            rank: player.rank,
        }];

        if reached_end {
            let winner = self.try_complete(now)?;
            let is_winner = winner.as_ref() == Some(user_id);
            if let Some(record) = self.finish_record(user_id, is_winner) {
                events.push(RoomEvent::PlayerFinished(record));
            }
            if let Some(winner_id) = winner {
                events.push(RoomEvent::RaceFinished { winner_id });
            }
        }
        Ok(events)
    }

    /// Take a player out of the race.
    ///
    /// Before the race starts the player is removed from the roster (and a
    /// pending countdown is cancelled). During the race the player's last state
    /// is frozen and the race continues without them.
    pub fn remove_player(
        &mut self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Vec<RoomEvent>, DomainError> {
        let idx = self.index_of(user_id)?;
        let left = RoomEvent::PlayerLeft {
            user_id: user_id.clone(),
        };

        match self.status {
            RoomStatus::Waiting => {
                self.roster.remove(idx);
                self.recompute_ranks();
                Ok(vec![left])
            }
            RoomStatus::Countdown => {
                self.transition(RoomStatus::Waiting)?;
                self.roster.remove(idx);
                self.recompute_ranks();
                Ok(vec![left, RoomEvent::CountdownCancelled])
            }
            RoomStatus::InProgress => {
                if !self.roster[idx].connected {
                    return Ok(Vec::new());
                }
                self.roster[idx].connected = false;
                let mut events = vec![left];
                if let Some(winner_id) = self.try_complete(now)? {
                    events.push(RoomEvent::RaceFinished { winner_id });
                }
                Ok(events)
            }
            // Results are final; only tell the others that the player went away.
            RoomStatus::Finished => Ok(vec![left]),
        }
    }

    /// Roster ordered by rank
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .roster
            .iter()
            .map(|p| Standing {
                user_id: p.user_id.clone(),
                display_name: p.display_name.clone(),
                wpm: p.wpm,
                accuracy: p.accuracy,
                progress: p.progress,
                rank: p.rank,
                finished: p.finished,
            })
            .collect();
        standings.sort_by_key(|s| s.rank);
        standings
    }

    /// Result row for a finished player, or `None` if they have not finished
    pub fn finish_record(&self, user_id: &UserId, is_winner: bool) -> Option<FinishRecord> {
        let player = self.player(user_id).filter(|p| p.finished)?;
        let time_taken_seconds = match (self.started_at, player.finished_at) {
            (Some(start), Some(end)) => end.seconds_since(start),
            _ => 0.0,
        };
        Some(FinishRecord {
            user_id: player.user_id.clone(),
            room_id: self.id.clone(),
            wpm: player.wpm,
            accuracy: player.accuracy,
            correct_chars: player.correct_chars,
            incorrect_chars: player.incorrect_chars,
            total_chars: player.correct_chars + player.incorrect_chars,
            time_taken_seconds,
            finish_position: player.rank,
            is_winner,
        })
    }

    fn index_of(&self, user_id: &UserId) -> Result<usize, DomainError> {
        self.roster
            .iter()
            .position(|p| &p.user_id == user_id)
            .ok_or_else(|| DomainError::PlayerNotInRoom(user_id.as_str().to_string()))
    }

    fn transition(&mut self, next: RoomStatus) -> Result<(), DomainError> {
        if !self.status.can_move_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Finished players first by finish time, then everyone else by WPM.
    /// Equal WPM keeps roster order.
    fn recompute_ranks(&mut self) {
        let mut order: Vec<usize> = (0..self.roster.len()).collect();
        order.sort_by(|&a, &b| {
            let (pa, pb) = (&self.roster[a], &self.roster[b]);
            match (pa.finished, pb.finished) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (true, true) => pa.finished_at.cmp(&pb.finished_at),
                (false, false) => pb.wpm.total_cmp(&pa.wpm),
            }
        });
        for (position, idx) in order.into_iter().enumerate() {
            self.roster[idx].rank = position + 1;
        }
    }

    /// Close the race once nobody connected is still racing and someone has
    /// finished. Returns the winner when the room moved to `Finished`.
    fn try_complete(&mut self, now: Timestamp) -> Result<Option<UserId>, DomainError> {
        if self.roster.iter().any(Player::is_racing) {
            return Ok(None);
        }
        let Some(winner_id) = self.select_winner() else {
            return Ok(None);
        };
        self.transition(RoomStatus::Finished)?;
        self.finished_at = Some(now);
        self.winner_id = Some(winner_id.clone());
        Ok(Some(winner_id))
    }

    /// Highest WPM among finishers; ties go to the earliest finisher.
    fn select_winner(&self) -> Option<UserId> {
        self.roster
            .iter()
            .filter(|p| p.finished)
            .min_by(|a, b| {
                b.wpm
                    .total_cmp(&a.wpm)
                    .then_with(|| a.finished_at.cmp(&b.finished_at))
            })
            .map(|p| p.user_id.clone())
    }
}
