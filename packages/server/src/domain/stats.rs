//! Typing performance calculator.
//!
//! Pure functions: no state, no clock. The caller supplies the elapsed time.

use serde::Serialize;

use super::error::StatsError;

/// Result of comparing a submission with its reference text
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TypingStats {
    pub wpm: f64,
    pub accuracy: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
}

impl TypingStats {
    pub fn total_chars(&self) -> usize {
        self.correct_chars + self.incorrect_chars
    }
}

/// Compute words-per-minute and accuracy for a submission.
///
/// Characters are compared position by position up to the shorter of the two
/// texts. Words are whitespace-separated tokens of the trimmed submission.
///
/// # Errors
///
/// Returns `StatsError::NegativeElapsed` when `elapsed_seconds < 0`.
pub fn calculate_stats(
    reference: &str,
    submitted: &str,
    elapsed_seconds: f64,
) -> Result<TypingStats, StatsError> {
    if elapsed_seconds < 0.0 {
        return Err(StatsError::NegativeElapsed(elapsed_seconds));
    }

    let (correct_chars, compared) = reference
        .chars()
        .zip(submitted.chars())
        .fold((0usize, 0usize), |(correct, compared), (expected, typed)| {
            (correct + usize::from(expected == typed), compared + 1)
        });
    let incorrect_chars = compared - correct_chars;

    let accuracy = if compared > 0 {
        100.0 * correct_chars as f64 / compared as f64
    } else {
        100.0
    };

    let words = submitted.split_whitespace().count();
    let wpm = if elapsed_seconds > 0.0 {
        words as f64 / (elapsed_seconds / 60.0)
    } else {
        0.0
    };

    Ok(TypingStats {
        wpm,
        accuracy,
        correct_chars,
        incorrect_chars,
    })
}
