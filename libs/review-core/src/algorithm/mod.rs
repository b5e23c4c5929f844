//! Spaced repetition scheduling.

pub mod sm2;

use chrono::{DateTime, Duration, Utc};

use crate::grade::Grade;
use crate::types::SchedulingState;

pub use sm2::Sm2;

/// Trait for spaced repetition algorithms.
///
/// Implementations are pure: the result depends only on the arguments, so a
/// scheduler can be shared across threads and called without locking.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the next scheduling state after a review.
    fn schedule(&self, state: &SchedulingState, grade: Grade, now: DateTime<Utc>) -> SchedulingState;

    /// Initial state for a new card.
    fn initial_state(&self, now: DateTime<Utc>) -> SchedulingState;
}

/// `now + interval` days, truncated to midnight UTC.
pub fn next_review_date(now: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
    let target = now
        .checked_add_signed(Duration::days(i64::from(interval)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    target.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}
