//! Survey domain model.
//!
//! # Responsibility
//! - Define canonical records for questionnaires, categories and answers.
//! - Keep validation rules next to the data they protect.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Questionnaires reference categories by ID only; category state is never
//!   embedded.
//! - Timestamps are Unix epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod answer;
pub mod category;
pub mod questionnaire;

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before the epoch read as `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
