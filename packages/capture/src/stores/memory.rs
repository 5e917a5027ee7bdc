//! In-memory conversation store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::traits::ConversationStore;
use crate::types::{new_id, Conversation, ConversationFilter};

#[derive(Default)]
struct Inner {
    conversations: HashMap<String, Conversation>,
    ids_by_url: HashMap<String, String>,
}

/// Conversation store backed by process memory.
///
/// The default store, and the reference for trait semantics: records are
/// normalized on save and `find_by_url` is an index lookup. Contents do
/// not survive the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn save(&self, conversation: &Conversation) -> Result<String> {
        let mut record = conversation.clone();

        // Normalize on the way in: every stored record has an id, a URL
        // key, and attachments tagged with the owning id.
        let id = if record.id.is_empty() {
            new_id()
        } else {
            record.id.clone()
        };
        record.assign_id(id.clone());
        if record.conversation_url.is_empty() {
            record.conversation_url = format!(
                "generic-{}-{}",
                record.source_chatbot.name().to_lowercase(),
                Utc::now().timestamp_millis()
            );
        }

        let mut inner = self.inner.write().await;
        // A re-save can move an id to a new URL; drop the stale key.
        let stale_url = inner
            .conversations
            .get(&id)
            .filter(|previous| previous.conversation_url != record.conversation_url)
            .map(|previous| previous.conversation_url.clone());
        if let Some(url) = stale_url {
            inner.ids_by_url.remove(&url);
        }
        inner
            .ids_by_url
            .insert(record.conversation_url.clone(), id.clone());
        inner.conversations.insert(id.clone(), record);
        debug!(id = %id, total = inner.conversations.len(), "conversation saved");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.inner.read().await.conversations.get(id).cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Conversation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ids_by_url
            .get(url)
            .and_then(|id| inner.conversations.get(id))
            .cloned())
    }

    async fn list(&self, filter: Option<&ConversationFilter>) -> Result<Vec<Conversation>> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| filter.map_or(true, |f| f.matches(c)))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(conversations)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(removed) = inner.conversations.remove(id) {
            inner.ids_by_url.remove(&removed.conversation_url);
            debug!(id = %id, "conversation deleted");
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.conversations.clear();
        inner.ids_by_url.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.conversations.len())
    }
}
