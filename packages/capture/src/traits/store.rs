//! Storage trait for persisted conversations.
//!
//! The store is an external collaborator: the capture core treats it as
//! an opaque, possibly-slow async dependency. The one efficiency
//! requirement is that `find_by_url` is a keyed lookup, since the merge
//! resolver runs it on every successful capture.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Conversation, ConversationFilter};

/// Persistent storage for captured conversations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Save a conversation, returning its id.
    ///
    /// Implementations normalize the record on the way in: a missing id
    /// gets a fresh one, a missing URL gets a generic per-platform key,
    /// and attachments are tagged with the conversation id.
    async fn save(&self, conversation: &Conversation) -> Result<String>;

    /// Get a conversation by id.
    async fn get(&self, id: &str) -> Result<Option<Conversation>>;

    /// Look up a conversation by its source URL (keyed, not a scan).
    async fn find_by_url(&self, url: &str) -> Result<Option<Conversation>>;

    /// List stored conversations, newest first, optionally filtered.
    async fn list(&self, filter: Option<&ConversationFilter>) -> Result<Vec<Conversation>>;

    /// Delete a conversation by id. Deleting an unknown id is a no-op.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete everything.
    async fn clear(&self) -> Result<()>;

    /// Number of stored conversations.
    async fn count(&self) -> Result<usize> {
        Ok(self.list(None).await?.len())
    }
}
