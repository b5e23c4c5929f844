//! Core types for the review engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReviewError, Result};

/// Ease factor assigned to a card that has never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
/// Hard floor for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Card identity. Also the tie-break key when two cards are due at the same instant.
    CardId
);
id_type!(DeckId);
id_type!(UserId);

/// Spaced repetition state owned by a single card.
///
/// Fields are private so an ease factor below [`MIN_EASE_FACTOR`] can never be
/// constructed; deserialization runs the same checks as [`SchedulingState::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedulingState")]
pub struct SchedulingState {
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
    next_review_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawSchedulingState {
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
    next_review_at: DateTime<Utc>,
}

impl TryFrom<RawSchedulingState> for SchedulingState {
    type Error = ReviewError;

    fn try_from(raw: RawSchedulingState) -> Result<Self> {
        Self::new(
            raw.interval,
            raw.repetitions,
            raw.ease_factor,
            raw.next_review_at,
        )
    }
}

impl SchedulingState {
    pub fn new(
        interval: u32,
        repetitions: u32,
        ease_factor: f64,
        next_review_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !ease_factor.is_finite() {
            return Err(ReviewError::InvalidState(format!(
                "ease factor must be finite, got {ease_factor}"
            )));
        }
        if ease_factor < MIN_EASE_FACTOR {
            return Err(ReviewError::InvalidState(format!(
                "ease factor {ease_factor} is below the minimum of {MIN_EASE_FACTOR}"
            )));
        }
        Ok(Self {
            interval,
            repetitions,
            ease_factor,
            next_review_at,
        })
    }

    /// State of a card that has never been reviewed: due immediately.
    pub fn pristine(now: DateTime<Utc>) -> Self {
        Self {
            interval: 0,
            repetitions: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            next_review_at: now,
        }
    }

    /// Callers inside the crate have already clamped the ease factor.
    pub(crate) fn from_parts(
        interval: u32,
        repetitions: u32,
        ease_factor: f64,
        next_review_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(ease_factor >= MIN_EASE_FACTOR);
        Self {
            interval,
            repetitions,
            ease_factor,
            next_review_at,
        }
    }

    /// Days until the next review.
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Consecutive successful reviews; zero for new or most recently failed cards.
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    pub fn next_review_at(&self) -> DateTime<Utc> {
        self.next_review_at
    }

    /// Inclusive: a card scheduled exactly at `as_of` is due.
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_review_at <= as_of
    }

    /// True until the first review has been recorded.
    pub fn is_new(&self) -> bool {
        self.interval == 0 && self.repetitions == 0
    }
}

/// A flashcard with its scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    deck_id: DeckId,
    user_id: UserId,
    front: String,
    back: String,
    #[serde(flatten)]
    scheduling: SchedulingState,
}

impl Card {
    /// Create a new card, due immediately.
    pub fn new(
        deck_id: DeckId,
        user_id: UserId,
        front: impl Into<String>,
        back: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CardId::new(),
            deck_id,
            user_id,
            front: front.into(),
            back: back.into(),
            scheduling: SchedulingState::pristine(now),
        }
    }

    /// Rebuild a card read back from storage.
    pub fn from_parts(
        id: CardId,
        deck_id: DeckId,
        user_id: UserId,
        front: String,
        back: String,
        scheduling: SchedulingState,
    ) -> Self {
        Self {
            id,
            deck_id,
            user_id,
            front,
            back,
            scheduling,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn scheduling(&self) -> &SchedulingState {
        &self.scheduling
    }

    /// Replace the scheduling state. Content is left untouched.
    pub fn apply_scheduling(&mut self, scheduling: SchedulingState) {
        self.scheduling = scheduling;
    }
}

/// A named collection of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Deck {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: DeckId::new(),
            user_id,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Card counts for one deck at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub deck_id: DeckId,
    pub card_count: usize,
    pub new_count: usize,
    pub due_count: usize,
}

impl DeckSummary {
    /// Counts for a deck with no cards.
    pub fn empty(deck_id: DeckId) -> Self {
        Self {
            deck_id,
            card_count: 0,
            new_count: 0,
            due_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn pristine_state_defaults() {
        let state = SchedulingState::pristine(at(1));
        assert_eq!(state.interval(), 0);
        assert_eq!(state.repetitions(), 0);
        assert_eq!(state.ease_factor(), DEFAULT_EASE_FACTOR);
        assert_eq!(state.next_review_at(), at(1));
        assert!(state.is_new());
    }

    #[test]
    fn rejects_ease_below_floor() {
        let result = SchedulingState::new(4, 2, 1.29, at(1));
        assert!(matches!(result, Err(ReviewError::InvalidState(_))));
    }

    #[test]
    fn rejects_non_finite_ease() {
        assert!(SchedulingState::new(4, 2, f64::NAN, at(1)).is_err());
        assert!(SchedulingState::new(4, 2, f64::INFINITY, at(1)).is_err());
    }

    #[test]
    fn accepts_ease_at_floor() {
        let state = SchedulingState::new(16, 3, MIN_EASE_FACTOR, at(1)).unwrap();
        assert_eq!(state.ease_factor(), 1.3);
    }

    #[test]
    fn due_is_inclusive() {
        let state = SchedulingState::new(1, 1, 2.5, at(2)).unwrap();
        assert!(!state.is_due(at(1)));
        assert!(state.is_due(at(2)));
        assert!(state.is_due(at(3)));
    }

    #[test]
    fn new_card_is_due_immediately() {
        let card = Card::new(DeckId::new(), UserId::new(), "Q", "A", at(5));
        assert!(card.scheduling().is_due(at(5)));
        assert_eq!(card.front(), "Q");
        assert_eq!(card.back(), "A");
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let state = SchedulingState::new(6, 2, 2.6, at(10)).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["interval"], 6);
        assert_eq!(json["repetitions"], 2);
        assert_eq!(json["ease_factor"], 2.6);
        assert_eq!(json["next_review_at"], "2024-03-10T00:00:00Z");
    }

    #[test]
    fn deserialization_enforces_ease_floor() {
        let json = r#"{"interval":1,"repetitions":1,"ease_factor":1.0,"next_review_at":"2024-03-10T00:00:00Z"}"#;
        assert!(serde_json::from_str::<SchedulingState>(json).is_err());
    }

    #[test]
    fn card_serializes_scheduling_inline() {
        let card = Card::new(DeckId::new(), UserId::new(), "front", "back", at(1));
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["front"], "front");
        assert_eq!(json["interval"], 0);
        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }
}
