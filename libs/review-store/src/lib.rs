//! PostgreSQL storage for review-core.
//!
//! Implements [`review_core::CardStore`] over the `decks` / `flashcards`
//! tables, plus the card and deck queries needed to populate them.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::StoreConfig;
pub use db::PgStore;
pub use error::{Result, StoreError};
