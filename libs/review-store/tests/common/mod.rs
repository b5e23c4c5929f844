//! Common test utilities for Postgres store integration tests.
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use review_core::{Card, Deck, DeckId, UserId};
use review_store::{PgStore, StoreConfig};

/// Test context holding a migrated store.
pub struct TestContext {
    pub store: PgStore,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        let config = StoreConfig::from_env().expect("DATABASE_URL must be set for integration tests");

        let store = PgStore::connect(&config)
            .await
            .expect("Failed to connect to test database");

        store
            .run_migrations()
            .await
            .expect("Failed to run migrations");

        Self { store }
    }

    /// Create a deck owned by a fresh user.
    pub async fn create_test_deck(&self, name: &str) -> (UserId, DeckId) {
        let user = UserId::new();
        let deck = Deck::new(user, name);
        self.store
            .create_deck(&deck)
            .await
            .expect("Failed to create test deck");
        (user, deck.id)
    }

    /// Create a card that becomes due at `due`.
    pub async fn create_test_card(
        &self,
        user: UserId,
        deck: DeckId,
        front: &str,
        due: DateTime<Utc>,
    ) -> Card {
        let card = Card::new(deck, user, front, format!("{front} (answer)"), due);
        self.store
            .create_card(&card)
            .await
            .expect("Failed to create test card");
        card
    }

    /// Remove everything owned by a test user.
    pub async fn cleanup_user(&self, user: UserId) {
        // Delete in order due to foreign keys
        let _ = sqlx::query("DELETE FROM flashcards WHERE user_id = $1")
            .bind(user.0)
            .execute(self.store.pool())
            .await;

        let _ = sqlx::query("DELETE FROM decks WHERE user_id = $1")
            .bind(user.0)
            .execute(self.store.pool())
            .await;
    }
}
