//! Review queue selection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::{Card, DeckId, DeckSummary};

/// Cards due at `as_of`, oldest due first.
///
/// Ties on the due instant are broken by card id, so selecting twice over the
/// same input always yields the same order.
pub fn select_due<I>(cards: I, as_of: DateTime<Utc>) -> Vec<Card>
where
    I: IntoIterator<Item = Card>,
{
    let mut due: Vec<Card> = cards
        .into_iter()
        .filter(|card| card.scheduling().is_due(as_of))
        .collect();
    due.sort_by(|a, b| {
        a.scheduling()
            .next_review_at()
            .cmp(&b.scheduling().next_review_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    due
}

/// Number of cards due at `as_of`.
pub fn count_due<'a, I>(cards: I, as_of: DateTime<Utc>) -> usize
where
    I: IntoIterator<Item = &'a Card>,
{
    cards
        .into_iter()
        .filter(|card| card.scheduling().is_due(as_of))
        .count()
}

/// Per-deck card counts, ordered by deck id.
pub fn summarize_decks<'a, I>(cards: I, as_of: DateTime<Utc>) -> Vec<DeckSummary>
where
    I: IntoIterator<Item = &'a Card>,
{
    let mut decks: BTreeMap<DeckId, DeckSummary> = BTreeMap::new();
    for card in cards {
        let summary = decks
            .entry(card.deck_id())
            .or_insert_with(|| DeckSummary::empty(card.deck_id()));
        summary.card_count += 1;
        if card.scheduling().is_new() {
            summary.new_count += 1;
        }
        if card.scheduling().is_due(as_of) {
            summary.due_count += 1;
        }
    }
    decks.into_values().collect()
}
