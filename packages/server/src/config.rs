//! Race tuning parameters.

use std::time::Duration;

/// Parameters shared by matchmaking and the race coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceConfig {
    /// Roster size that arms the countdown
    pub room_capacity: usize,
    /// First value of the countdown; the sequence runs down to 0 ("go")
    pub countdown_from: u32,
    /// Delay between countdown ticks
    pub countdown_interval: Duration,
    /// How many rooms matchmaking tries before giving up
    pub join_attempts: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            room_capacity: 3,
            countdown_from: 3,
            countdown_interval: Duration::from_secs(1),
            join_attempts: 3,
        }
    }
}

impl RaceConfig {
    pub fn with_room_capacity(mut self, room_capacity: usize) -> Self {
        self.room_capacity = room_capacity.max(1);
        self
    }

    pub fn with_countdown(mut self, from: u32, interval: Duration) -> Self {
        self.countdown_from = from;
        self.countdown_interval = interval;
        self
    }
}
