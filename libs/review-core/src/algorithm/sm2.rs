//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2:
//! - Grades below 3 reset the repetition count and schedule the card for tomorrow;
//!   the ease factor is left alone.
//! - Passing grades step the interval 1 day, 6 days, then `ceil(interval * ease)`.
//! - The ease factor moves by `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)` on every
//!   passing grade and never drops below 1.3.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{next_review_date, SpacedRepetitionAlgorithm};
use crate::error::{ReviewError, Result};
use crate::grade::Grade;
use crate::types::{SchedulingState, DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};

/// Interval after a failed recall, regardless of parameters.
const RELEARN_INTERVAL: u32 = 1;

/// SM-2 algorithm with configurable parameters.
///
/// Deserialized parameters are validated; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSm2")]
pub struct Sm2 {
    pub initial_ease: f64,
    pub first_interval: u32,
    pub second_interval: u32,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawSm2 {
    initial_ease: f64,
    first_interval: u32,
    second_interval: u32,
}

impl Default for RawSm2 {
    fn default() -> Self {
        let sm2 = Sm2::default();
        Self {
            initial_ease: sm2.initial_ease,
            first_interval: sm2.first_interval,
            second_interval: sm2.second_interval,
        }
    }
}

impl TryFrom<RawSm2> for Sm2 {
    type Error = ReviewError;

    fn try_from(raw: RawSm2) -> Result<Self> {
        let sm2 = Self {
            initial_ease: raw.initial_ease,
            first_interval: raw.first_interval,
            second_interval: raw.second_interval,
        };
        sm2.validate()?;
        Ok(sm2)
    }
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: DEFAULT_EASE_FACTOR,
            first_interval: 1,
            second_interval: 6,
        }
    }
}

impl Sm2 {
    /// Check parameters loaded from configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_ease.is_finite() || self.initial_ease < MIN_EASE_FACTOR {
            return Err(ReviewError::InvalidConfig(format!(
                "initial_ease must be at least {MIN_EASE_FACTOR}, got {}",
                self.initial_ease
            )));
        }
        if self.first_interval == 0 || self.second_interval == 0 {
            return Err(ReviewError::InvalidConfig(
                "intervals must be at least one day".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate a raw grade and schedule the card.
    ///
    /// An invalid grade is rejected before anything is computed.
    pub fn apply(
        &self,
        state: &SchedulingState,
        grade: i64,
        now: DateTime<Utc>,
    ) -> Result<SchedulingState> {
        let grade = Grade::new(grade)?;
        Ok(self.schedule(state, grade, now))
    }

    /// A reviewed card is never due again the same day, even when the
    /// parameters were built by hand with a zero step.
    fn next_interval(&self, state: &SchedulingState, repetitions: u32) -> u32 {
        let interval = match repetitions {
            1 => self.first_interval,
            2 => self.second_interval,
            _ => {
                let grown = (f64::from(state.interval()) * state.ease_factor()).ceil();
                if grown >= f64::from(u32::MAX) {
                    u32::MAX
                } else {
                    grown as u32
                }
            }
        };
        interval.max(1)
    }
}

/// Change in ease factor for a passing grade.
fn ease_delta(grade: Grade) -> f64 {
    let distance = f64::from(5 - grade.value());
    0.1 - distance * (0.08 + distance * 0.02)
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self, now: DateTime<Utc>) -> SchedulingState {
        SchedulingState::from_parts(0, 0, self.initial_ease.max(MIN_EASE_FACTOR), now)
    }

    fn schedule(&self, state: &SchedulingState, grade: Grade, now: DateTime<Utc>) -> SchedulingState {
        let (interval, repetitions, ease_factor) = if grade.is_passing() {
            let repetitions = state.repetitions().saturating_add(1);
            // Growth uses the previous interval and ease, before the ease update.
            let interval = self.next_interval(state, repetitions);
            let ease_factor = (state.ease_factor() + ease_delta(grade)).max(MIN_EASE_FACTOR);
            (interval, repetitions, ease_factor)
        } else {
            (RELEARN_INTERVAL, 0, state.ease_factor())
        };

        SchedulingState::from_parts(
            interval,
            repetitions,
            ease_factor,
            next_review_date(now, interval),
        )
    }
}

/// Apply SM-2 with the default parameters.
pub fn apply(state: &SchedulingState, grade: i64, now: DateTime<Utc>) -> Result<SchedulingState> {
    Sm2::default().apply(state, grade, now)
}
