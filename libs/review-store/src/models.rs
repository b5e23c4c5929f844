//! Database row types and conversions to review-core types

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use review_core::{Card, CardId, Deck, DeckId, SchedulingState, UserId, DEFAULT_EASE_FACTOR};

use crate::error::{Result, StoreError};

/// Deck stored in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbDeck {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbDeck {
    pub fn to_core_deck(&self) -> Deck {
        Deck {
            id: DeckId(self.id),
            user_id: UserId(self.user_id),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Flashcard stored in PostgreSQL.
///
/// Scheduling columns may be NULL; missing values read back as a card that
/// has never been reviewed, due from its creation time.
#[derive(Debug, Clone, FromRow)]
pub struct DbFlashcard {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub user_id: Uuid,
    pub front: String,
    pub back: String,
    pub interval: Option<i32>,
    pub repetitions: Option<i32>,
    pub ease_factor: Option<f64>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbFlashcard {
    /// Convert to a review-core card, rejecting rows that break scheduling invariants
    pub fn to_core_card(&self) -> Result<Card> {
        let interval = non_negative("interval", self.interval.unwrap_or(0), self.id)?;
        let repetitions = non_negative("repetitions", self.repetitions.unwrap_or(0), self.id)?;
        let scheduling = SchedulingState::new(
            interval,
            repetitions,
            self.ease_factor.unwrap_or(DEFAULT_EASE_FACTOR),
            self.next_review_at.unwrap_or(self.created_at),
        )
        .map_err(|e| StoreError::InvalidData(format!("flashcard {}: {e}", self.id)))?;

        Ok(Card::from_parts(
            CardId(self.id),
            DeckId(self.deck_id),
            UserId(self.user_id),
            self.front.clone(),
            self.back.clone(),
            scheduling,
        ))
    }
}

fn non_negative(column: &str, value: i32, id: Uuid) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("flashcard {id}: negative {column} {value}")))
}

/// Scheduling columns as bound into an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingColumns {
    pub interval: i32,
    pub repetitions: i32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
}

impl TryFrom<&SchedulingState> for SchedulingColumns {
    type Error = StoreError;

    fn try_from(state: &SchedulingState) -> Result<Self> {
        let interval = i32::try_from(state.interval()).map_err(|_| {
            StoreError::InvalidData(format!("interval {} does not fit the column", state.interval()))
        })?;
        let repetitions = i32::try_from(state.repetitions()).map_err(|_| {
            StoreError::InvalidData(format!(
                "repetitions {} does not fit the column",
                state.repetitions()
            ))
        })?;
        Ok(Self {
            interval,
            repetitions,
            ease_factor: state.ease_factor(),
            next_review_at: state.next_review_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
    }

    fn row() -> DbFlashcard {
        DbFlashcard {
            id: Uuid::from_u128(42),
            deck_id: Uuid::from_u128(2),
            user_id: Uuid::from_u128(3),
            front: "¿Qué es Rust?".to_string(),
            back: "Un lenguaje de sistemas".to_string(),
            interval: Some(6),
            repetitions: Some(2),
            ease_factor: Some(2.6),
            next_review_at: Some(Utc.with_ymd_and_hms(2024, 2, 7, 0, 0, 0).unwrap()),
            created_at: created(),
            updated_at: created(),
        }
    }

    #[test]
    fn test_row_converts_to_card() {
        let card = row().to_core_card().unwrap();
        assert_eq!(card.id(), CardId(Uuid::from_u128(42)));
        assert_eq!(card.front(), "¿Qué es Rust?");
        assert_eq!(card.scheduling().interval(), 6);
        assert_eq!(card.scheduling().repetitions(), 2);
        assert_eq!(card.scheduling().ease_factor(), 2.6);
    }

    #[test]
    fn test_null_scheduling_columns_read_as_new_card() {
        let mut row = row();
        row.interval = None;
        row.repetitions = None;
        row.ease_factor = None;
        row.next_review_at = None;

        let card = row.to_core_card().unwrap();
        assert_eq!(card.scheduling(), &SchedulingState::pristine(created()));
    }

    #[test]
    fn test_negative_interval_is_invalid() {
        let mut row = row();
        row.interval = Some(-1);
        assert!(matches!(row.to_core_card(), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_low_ease_is_invalid() {
        let mut row = row();
        row.ease_factor = Some(1.1);
        assert!(matches!(row.to_core_card(), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_scheduling_columns_from_state() {
        let due = Utc.with_ymd_and_hms(2024, 2, 23, 0, 0, 0).unwrap();
        let state = SchedulingState::new(16, 3, 2.46, due).unwrap();
        let columns = SchedulingColumns::try_from(&state).unwrap();
        assert_eq!(
            columns,
            SchedulingColumns {
                interval: 16,
                repetitions: 3,
                ease_factor: 2.46,
                next_review_at: due,
            }
        );
    }

    #[test]
    fn test_oversized_interval_is_rejected() {
        let state = SchedulingState::new(u32::MAX, 3, 2.5, created()).unwrap();
        assert!(SchedulingColumns::try_from(&state).is_err());
    }

    #[test]
    fn test_deck_row_converts() {
        let deck = DbDeck {
            id: Uuid::from_u128(9),
            user_id: Uuid::from_u128(3),
            name: "Verbos".to_string(),
            description: Some("Irregulares".to_string()),
            created_at: created(),
            updated_at: created(),
        };
        let core = deck.to_core_deck();
        assert_eq!(core.name, "Verbos");
        assert_eq!(core.description.as_deref(), Some("Irregulares"));
        assert_eq!(core.id, DeckId(Uuid::from_u128(9)));
    }
}
