//! Deck Loading - 课件清单加载

mod manifest;

pub use manifest::{load_deck, DeckError};
