//! Review session controller.
//!
//! A session freezes the due queue when it starts and walks it one card at a
//! time: the front is presented, the back is revealed, a grade is applied and
//! written through the store, then the next card is presented. Cards that
//! become due while a session is running are picked up by the next session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::algorithm::{Sm2, SpacedRepetitionAlgorithm};
use crate::error::{ReviewError, Result};
use crate::grade::{Difficulty, Grade};
use crate::selector::select_due;
use crate::store::CardStore;
use crate::types::{Card, CardId, DeckId, SchedulingState, UserId};

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Front of the card is shown.
    Presenting(Card),
    /// Back of the card is shown and grading is possible.
    Revealed(Card),
    /// Queue exhausted. No further transitions.
    Complete,
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            Self::Presenting(_) => "presenting",
            Self::Revealed(_) => "revealed",
            Self::Complete => "complete",
        }
    }
}

/// Counters for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub reviewed: usize,
    pub skipped: usize,
    pub remaining: usize,
}

/// Record of one graded card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub card_id: CardId,
    pub grade: Grade,
    pub before: SchedulingState,
    pub after: SchedulingState,
}

/// Drives a queue of due cards through the scheduler.
pub struct ReviewSession<S, A = Sm2> {
    store: S,
    algorithm: A,
    state: SessionState,
    queue: VecDeque<Card>,
    total: usize,
    skipped: usize,
    outcomes: Vec<ReviewOutcome>,
}

impl<S, A> ReviewSession<S, A>
where
    S: CardStore,
    A: SpacedRepetitionAlgorithm,
{
    /// Pull the due cards from the store and start presenting.
    pub async fn start(
        store: S,
        algorithm: A,
        user_id: UserId,
        deck_id: Option<DeckId>,
        as_of: DateTime<Utc>,
    ) -> Result<Self> {
        let cards = store.read_cards_due_by(user_id, deck_id, as_of).await?;
        debug!(%user_id, deck_id = ?deck_id, fetched = cards.len(), "loaded review candidates");
        Ok(Self::from_cards(store, algorithm, cards, as_of))
    }

    /// Start from cards that were already fetched.
    pub fn from_cards<I>(store: S, algorithm: A, cards: I, as_of: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = Card>,
    {
        let mut queue: VecDeque<Card> = select_due(cards, as_of).into();
        let total = queue.len();
        let state = match queue.pop_front() {
            Some(card) => SessionState::Presenting(card),
            None => SessionState::Complete,
        };
        info!(total, algorithm = algorithm.name(), "review session started");

        Self {
            store,
            algorithm,
            state,
            queue,
            total,
            skipped: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Card being presented or revealed.
    pub fn current(&self) -> Option<&Card> {
        match &self.state {
            SessionState::Presenting(card) | SessionState::Revealed(card) => Some(card),
            SessionState::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Complete)
    }

    pub fn progress(&self) -> SessionProgress {
        let in_hand = usize::from(self.current().is_some());
        SessionProgress {
            total: self.total,
            reviewed: self.outcomes.len(),
            skipped: self.skipped,
            remaining: self.queue.len() + in_hand,
        }
    }

    /// Graded cards, in the order they were written.
    pub fn outcomes(&self) -> &[ReviewOutcome] {
        &self.outcomes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Show the back of the current card.
    pub fn reveal(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SessionState::Complete) {
            SessionState::Presenting(card) => {
                self.state = SessionState::Revealed(card);
                Ok(())
            }
            other => {
                let state = other.label();
                self.state = other;
                Err(ReviewError::InvalidTransition {
                    action: "reveal",
                    state,
                })
            }
        }
    }

    /// Grade the revealed card with a raw 0-5 value.
    pub async fn grade(&mut self, grade: i64, now: DateTime<Utc>) -> Result<ReviewOutcome> {
        let grade = Grade::new(grade)?;
        self.apply_grade(grade, now).await
    }

    /// Grade the revealed card with one of the three buttons.
    pub async fn grade_difficulty(
        &mut self,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        self.apply_grade(difficulty.grade(), now).await
    }

    /// Move past the current card without writing anything.
    pub fn skip(&mut self) -> Result<()> {
        match &self.state {
            SessionState::Presenting(card) | SessionState::Revealed(card) => {
                debug!(card_id = %card.id(), "card skipped");
                self.skipped += 1;
                self.advance();
                Ok(())
            }
            SessionState::Complete => Err(ReviewError::InvalidTransition {
                action: "skip",
                state: "complete",
            }),
        }
    }

    async fn apply_grade(&mut self, grade: Grade, now: DateTime<Utc>) -> Result<ReviewOutcome> {
        let card = match &self.state {
            SessionState::Revealed(card) => card,
            other => {
                return Err(ReviewError::InvalidTransition {
                    action: "grade",
                    state: other.label(),
                })
            }
        };

        let card_id = card.id();
        let before = card.scheduling().clone();
        let after = self.algorithm.schedule(&before, grade, now);

        // Position only moves once the write has succeeded.
        if let Err(err) = self.store.write_scheduling_state(card_id, &after).await {
            warn!(%card_id, %grade, error = %err, "failed to persist scheduling state");
            return Err(err.into());
        }

        info!(
            %card_id,
            %grade,
            interval = after.interval(),
            repetitions = after.repetitions(),
            ease_factor = after.ease_factor(),
            "card reviewed"
        );

        let outcome = ReviewOutcome {
            card_id,
            grade,
            before,
            after,
        };
        self.outcomes.push(outcome.clone());
        self.advance();
        Ok(outcome)
    }

    fn advance(&mut self) {
        self.state = match self.queue.pop_front() {
            Some(card) => SessionState::Presenting(card),
            None => {
                info!(
                    reviewed = self.outcomes.len(),
                    skipped = self.skipped,
                    "review session complete"
                );
                SessionState::Complete
            }
        };
    }
}
