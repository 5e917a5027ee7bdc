//! Core trait abstractions: the page seam and the store seam.

pub mod page;
pub mod store;

pub use page::{PageSnapshot, PageSource};
pub use store::ConversationStore;
