//! Spaced repetition review engine.
//!
//! Provides:
//! - SM-2 scheduling of a card's next review from a 0-5 recall grade
//! - Due-queue selection with a deterministic order
//! - A review session controller that walks the queue and persists each grade
//! - The `CardStore` capability the session writes through, plus an in-memory store
//!
//! Nothing here reads the clock: every operation takes `now` / `as_of` explicitly.

pub mod algorithm;
pub mod error;
pub mod grade;
pub mod selector;
pub mod session;
pub mod store;
pub mod types;

pub use algorithm::sm2::apply;
pub use algorithm::{next_review_date, Sm2, SpacedRepetitionAlgorithm};
pub use error::{PersistenceError, Result, ReviewError};
pub use grade::{Difficulty, Grade, MAX_GRADE, MIN_GRADE, PASSING_GRADE};
pub use selector::{count_due, select_due, summarize_decks};
pub use session::{ReviewOutcome, ReviewSession, SessionProgress, SessionState};
pub use store::{CardStore, MemoryStore};
pub use types::{
    Card, CardId, Deck, DeckId, DeckSummary, SchedulingState, UserId, DEFAULT_EASE_FACTOR,
    MIN_EASE_FACTOR,
};
