//! Storage capability used by review sessions.
//!
//! The review engine only ever needs two things from storage: the cards due
//! for a user, and a targeted write of one card's scheduling state.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::PersistenceError;
use crate::types::{Card, CardId, DeckId, SchedulingState, UserId};

/// Persistent card storage.
pub trait CardStore: Send + Sync {
    /// Cards owned by `user_id` with `next_review_at <= as_of`, optionally
    /// limited to one deck. Order is not part of the contract.
    fn read_cards_due_by(
        &self,
        user_id: UserId,
        deck_id: Option<DeckId>,
        as_of: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Card>, PersistenceError>> + Send;

    /// Overwrite the four scheduling fields of one card. Content and deck are
    /// never touched.
    fn write_scheduling_state(
        &self,
        card_id: CardId,
        state: &SchedulingState,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// In-memory card store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: Mutex<BTreeMap<CardId, Card>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards<I>(cards: I) -> Self
    where
        I: IntoIterator<Item = Card>,
    {
        Self {
            cards: Mutex::new(cards.into_iter().map(|card| (card.id(), card)).collect()),
        }
    }

    /// Insert or replace a card.
    pub fn insert(&self, card: Card) -> Result<(), PersistenceError> {
        self.lock()?.insert(card.id(), card);
        Ok(())
    }

    pub fn get(&self, card_id: CardId) -> Result<Option<Card>, PersistenceError> {
        Ok(self.lock()?.get(&card_id).cloned())
    }

    pub fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<CardId, Card>>, PersistenceError> {
        self.cards
            .lock()
            .map_err(|_| PersistenceError::new("memory store lock poisoned"))
    }
}

impl CardStore for MemoryStore {
    async fn read_cards_due_by(
        &self,
        user_id: UserId,
        deck_id: Option<DeckId>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Card>, PersistenceError> {
        let cards = self.lock()?;
        Ok(cards
            .values()
            .filter(|card| card.user_id() == user_id)
            .filter(|card| deck_id.map_or(true, |deck| card.deck_id() == deck))
            .filter(|card| card.scheduling().is_due(as_of))
            .cloned()
            .collect())
    }

    async fn write_scheduling_state(
        &self,
        card_id: CardId,
        state: &SchedulingState,
    ) -> Result<(), PersistenceError> {
        let mut cards = self.lock()?;
        match cards.get_mut(&card_id) {
            Some(card) => {
                card.apply_scheduling(state.clone());
                Ok(())
            }
            None => Err(PersistenceError::new(format!("card not found: {card_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn reads_only_due_cards_for_user() {
        let user = UserId::new();
        let deck = DeckId::new();
        let due = Card::new(deck, user, "due", "a", now() - Duration::days(1));
        let later = Card::new(deck, user, "later", "b", now() + Duration::days(1));
        let other_user = Card::new(deck, UserId::new(), "other", "c", now());
        let store = MemoryStore::with_cards([due.clone(), later, other_user]);

        let cards = store.read_cards_due_by(user, None, now()).await.unwrap();
        assert_eq!(cards, vec![due]);
    }

    #[tokio::test]
    async fn scopes_to_deck() {
        let user = UserId::new();
        let wanted = DeckId::new();
        let store = MemoryStore::with_cards([
            Card::new(wanted, user, "one", "1", now()),
            Card::new(DeckId::new(), user, "two", "2", now()),
        ]);

        let cards = store
            .read_cards_due_by(user, Some(wanted), now())
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].deck_id(), wanted);
    }

    #[tokio::test]
    async fn write_updates_scheduling_only() {
        let card = Card::new(DeckId::new(), UserId::new(), "front", "back", now());
        let store = MemoryStore::with_cards([card.clone()]);
        let next = SchedulingState::new(6, 2, 2.6, now() + Duration::days(6)).unwrap();

        store.write_scheduling_state(card.id(), &next).await.unwrap();

        let stored = store.get(card.id()).unwrap().unwrap();
        assert_eq!(stored.scheduling(), &next);
        assert_eq!(stored.front(), "front");
        assert_eq!(stored.back(), "back");
        assert_eq!(stored.deck_id(), card.deck_id());
    }

    #[tokio::test]
    async fn write_to_unknown_card_fails() {
        let store = MemoryStore::new();
        let state = SchedulingState::pristine(now());
        let err = store
            .write_scheduling_state(CardId::new(), &state)
            .await
            .unwrap_err();
        assert!(err.message().starts_with("card not found"));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn poisoned_lock_is_reported_by_len() {
        let store = std::sync::Arc::new(MemoryStore::with_cards([Card::new(
            DeckId::new(),
            UserId::new(),
            "front",
            "back",
            now(),
        )]));
        assert_eq!(store.len().unwrap(), 1);

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.cards.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.len().is_err());
        assert!(store.is_empty().is_err());
    }
}
