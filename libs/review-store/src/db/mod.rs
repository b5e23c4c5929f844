//! PostgreSQL card store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, warn};

use review_core::{
    select_due, summarize_decks, Card, CardId, CardStore, Deck, DeckId, DeckSummary,
    PersistenceError, SchedulingState, UserId,
};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::{DbDeck, DbFlashcard, SchedulingColumns};

const FLASHCARD_COLUMNS: &str = r#"id, deck_id, user_id, front, back, "interval", repetitions,
    ease_factor, next_review_at, created_at, updated_at"#;

/// Card store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Deck Repository ===

    /// Insert a deck
    pub async fn create_deck(&self, deck: &Deck) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decks (id, user_id, name, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(deck.id.0)
        .bind(deck.user_id.0)
        .bind(&deck.name)
        .bind(&deck.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get deck by ID
    pub async fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM decks
            WHERE id = $1
            "#,
        )
        .bind(deck_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deck.map(|d| d.to_core_deck()))
    }

    /// Get all decks for a user
    pub async fn list_decks(&self, user_id: UserId) -> Result<Vec<Deck>> {
        let decks = sqlx::query_as::<_, DbDeck>(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM decks
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(decks.iter().map(DbDeck::to_core_deck).collect())
    }

    // === Card Repository ===

    /// Insert a card together with its scheduling state
    pub async fn create_card(&self, card: &Card) -> Result<()> {
        let columns = SchedulingColumns::try_from(card.scheduling())?;
        sqlx::query(
            r#"
            INSERT INTO flashcards (id, deck_id, user_id, front, back,
                                    "interval", repetitions, ease_factor, next_review_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(card.id().0)
        .bind(card.deck_id().0)
        .bind(card.user_id().0)
        .bind(card.front())
        .bind(card.back())
        .bind(columns.interval)
        .bind(columns.repetitions)
        .bind(columns.ease_factor)
        .bind(columns.next_review_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get card by ID
    pub async fn get_card(&self, card_id: CardId) -> Result<Option<Card>> {
        let row = sqlx::query_as::<_, DbFlashcard>(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = $1"
        ))
        .bind(card_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.to_core_card()).transpose()
    }

    /// Get all cards for a user, optionally filtered by deck
    pub async fn list_cards(&self, user_id: UserId, deck_id: Option<DeckId>) -> Result<Vec<Card>> {
        let rows = match deck_id {
            Some(deck) => {
                sqlx::query_as::<_, DbFlashcard>(&format!(
                    r#"
                    SELECT {FLASHCARD_COLUMNS}
                    FROM flashcards
                    WHERE user_id = $1 AND deck_id = $2
                    ORDER BY created_at, id
                    "#
                ))
                .bind(user_id.0)
                .bind(deck.0)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbFlashcard>(&format!(
                    r#"
                    SELECT {FLASHCARD_COLUMNS}
                    FROM flashcards
                    WHERE user_id = $1
                    ORDER BY created_at, id
                    "#
                ))
                .bind(user_id.0)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(DbFlashcard::to_core_card).collect()
    }

    /// Get cards due for review, oldest due first
    pub async fn get_due_cards(
        &self,
        user_id: UserId,
        deck_id: Option<DeckId>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Card>> {
        let rows = match deck_id {
            Some(deck) => {
                sqlx::query_as::<_, DbFlashcard>(&format!(
                    r#"
                    SELECT {FLASHCARD_COLUMNS}
                    FROM flashcards
                    WHERE user_id = $1 AND deck_id = $2
                      AND COALESCE(next_review_at, created_at) <= $3
                    ORDER BY COALESCE(next_review_at, created_at), id
                    "#
                ))
                .bind(user_id.0)
                .bind(deck.0)
                .bind(as_of)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbFlashcard>(&format!(
                    r#"
                    SELECT {FLASHCARD_COLUMNS}
                    FROM flashcards
                    WHERE user_id = $1
                      AND COALESCE(next_review_at, created_at) <= $2
                    ORDER BY COALESCE(next_review_at, created_at), id
                    "#
                ))
                .bind(user_id.0)
                .bind(as_of)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(%user_id, deck_id = ?deck_id, due = rows.len(), "fetched due flashcards");
        let cards = rows
            .iter()
            .map(DbFlashcard::to_core_card)
            .collect::<Result<Vec<_>>>()?;
        Ok(select_due(cards, as_of))
    }

    /// Update the four scheduling columns of one card
    pub async fn update_scheduling(&self, card_id: CardId, state: &SchedulingState) -> Result<()> {
        let columns = SchedulingColumns::try_from(state)?;
        let result = sqlx::query(
            r#"
            UPDATE flashcards
            SET "interval" = $2,
                repetitions = $3,
                ease_factor = $4,
                next_review_at = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(card_id.0)
        .bind(columns.interval)
        .bind(columns.repetitions)
        .bind(columns.ease_factor)
        .bind(columns.next_review_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(%card_id, "scheduling update matched no flashcard");
            return Err(StoreError::CardNotFound(card_id));
        }

        debug!(%card_id, interval = columns.interval, "scheduling state written");
        Ok(())
    }

    /// Per-deck card counts for a user, ordered by deck id.
    ///
    /// Every deck the user owns is listed, including decks with no cards.
    pub async fn deck_summaries(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<DeckSummary>> {
        let decks = self.list_decks(user_id).await?;
        let cards = self.list_cards(user_id, None).await?;

        let mut summaries: BTreeMap<DeckId, DeckSummary> = summarize_decks(&cards, as_of)
            .into_iter()
            .map(|summary| (summary.deck_id, summary))
            .collect();
        for deck in decks {
            summaries
                .entry(deck.id)
                .or_insert_with(|| DeckSummary::empty(deck.id));
        }
        Ok(summaries.into_values().collect())
    }
}

impl CardStore for PgStore {
    async fn read_cards_due_by(
        &self,
        user_id: UserId,
        deck_id: Option<DeckId>,
        as_of: DateTime<Utc>,
    ) -> std::result::Result<Vec<Card>, PersistenceError> {
        Ok(self.get_due_cards(user_id, deck_id, as_of).await?)
    }

    async fn write_scheduling_state(
        &self,
        card_id: CardId,
        state: &SchedulingState,
    ) -> std::result::Result<(), PersistenceError> {
        Ok(self.update_scheduling(card_id, state).await?)
    }
}
