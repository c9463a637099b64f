//! Storage trait definitions.

mod history;

pub use history::HistoryStore;
