//! Merge-on-URL persistence.
//!
//! A conversation page is captured many times as it grows, so the store
//! must end up with one record per URL. Before saving, the resolver
//! looks for an existing record with the same URL, carries its id over
//! onto the fresh capture, and removes the stale record. Lookup and
//! delete failures degrade rather than abort: a failed lookup falls
//! back to a list scan, and a failed delete still lets the save proceed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::ConversationStore;
use crate::types::Conversation;

/// Buffered captures waiting on the persister task.
const PERSIST_QUEUE_DEPTH: usize = 16;

/// Save a conversation, merging with any stored record for the same URL.
///
/// Returns the id the conversation was stored under. When a record with
/// the same URL already exists, the new capture takes over its id and
/// the old record is deleted first, so repeated captures of a growing
/// page update one record in place.
pub async fn persist_conversation<S>(store: &S, conversation: &Conversation) -> Result<String>
where
    S: ConversationStore + ?Sized,
{
    let existing = match store.find_by_url(&conversation.conversation_url).await {
        Ok(found) => found,
        Err(err) => {
            warn!(
                url = %conversation.conversation_url,
                error = %err,
                "url lookup failed, falling back to list scan"
            );
            scan_by_url(store, &conversation.conversation_url).await?
        }
    };

    let mut record = conversation.clone();
    if let Some(existing) = existing {
        debug!(
            id = %existing.id,
            url = %record.conversation_url,
            "replacing stored conversation for url"
        );
        record.assign_id(existing.id.clone());
        if let Err(err) = store.delete(&existing.id).await {
            // Orphaned duplicate at worst; the save must still happen.
            warn!(id = %existing.id, error = %err, "failed to delete replaced conversation");
        }
    }

    let id = store.save(&record).await?;
    info!(
        id = %id,
        platform = %record.source_chatbot,
        interactions = record.interactions.len(),
        "conversation persisted"
    );
    Ok(id)
}

async fn scan_by_url<S>(store: &S, url: &str) -> Result<Option<Conversation>>
where
    S: ConversationStore + ?Sized,
{
    let all = store.list(None).await?;
    Ok(all.into_iter().find(|c| c.conversation_url == url))
}

/// Spawn a task that persists queued conversations one at a time.
///
/// Captures are produced on a timer and saves can be slow, so writes go
/// through a single consumer to keep them ordered per session. Dropping
/// the sender shuts the task down after the queue drains.
pub fn spawn_persister<S>(store: Arc<S>) -> (mpsc::Sender<Conversation>, JoinHandle<()>)
where
    S: ConversationStore + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Conversation>(PERSIST_QUEUE_DEPTH);
    let handle = tokio::spawn(async move {
        while let Some(conversation) = rx.recv().await {
            if let Err(err) = persist_conversation(store.as_ref(), &conversation).await {
                warn!(
                    url = %conversation.conversation_url,
                    error = %err,
                    "failed to persist captured conversation"
                );
            }
        }
        debug!("persister shutting down");
    });
    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::FlakyStore;
    use crate::types::{Actor, Conversation, Platform, Utterance};

    fn capture(url: &str, content: &str) -> Conversation {
        let mut conversation = Conversation::shell(Platform::Claude, url);
        conversation
            .interactions
            .push(Utterance::new(Actor::User, content));
        conversation
    }

    #[tokio::test]
    async fn test_repeated_captures_of_one_url_keep_one_record() {
        let store = MemoryStore::new();
        let url = "https://claude.ai/chat/abc";

        persist_conversation(&store, &capture(url, "first pass")).await.unwrap();
        persist_conversation(&store, &capture(url, "first pass, then more")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.find_by_url(url).await.unwrap().unwrap();
        assert_eq!(stored.interactions[0].content, "first pass, then more");
    }

    #[tokio::test]
    async fn test_replacement_keeps_the_original_id() {
        let store = MemoryStore::new();
        let url = "https://claude.ai/chat/abc";

        let first_id = persist_conversation(&store, &capture(url, "first pass")).await.unwrap();
        let second_id = persist_conversation(&store, &capture(url, "second pass")).await.unwrap();

        assert_eq!(first_id, second_id);
    }

    #[tokio::test]
    async fn test_different_urls_stay_separate() {
        let store = MemoryStore::new();

        persist_conversation(&store, &capture("https://claude.ai/chat/a", "one")).await.unwrap();
        persist_conversation(&store, &capture("https://claude.ai/chat/b", "two")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_block_the_save() {
        let store = FlakyStore::new(MemoryStore::new());
        let url = "https://claude.ai/chat/abc";

        persist_conversation(&store, &capture(url, "first pass")).await.unwrap();
        store.fail_delete(true);
        persist_conversation(&store, &capture(url, "second pass")).await.unwrap();

        let stored = store.find_by_url(url).await.unwrap().unwrap();
        assert_eq!(stored.interactions[0].content, "second pass");
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_scanning() {
        let store = FlakyStore::new(MemoryStore::new());
        let url = "https://claude.ai/chat/abc";

        let first_id = persist_conversation(&store, &capture(url, "first pass")).await.unwrap();
        store.fail_find_by_url(true);
        let second_id = persist_conversation(&store, &capture(url, "second pass")).await.unwrap();

        // The scan still found the earlier record, so no second copy.
        assert_eq!(first_id, second_id);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persister_task_drains_and_stops() {
        let store = Arc::new(MemoryStore::new());
        let (tx, handle) = spawn_persister(Arc::clone(&store));

        tx.send(capture("https://claude.ai/chat/a", "queued one")).await.unwrap();
        tx.send(capture("https://claude.ai/chat/b", "queued two")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }
}
