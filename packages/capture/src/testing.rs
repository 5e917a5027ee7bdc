//! Test doubles and fixture builders shared across the test suite.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{CaptureError, PageError, Result};
use crate::traits::{ConversationStore, PageSnapshot, PageSource};
use crate::types::{Actor, Conversation, ConversationFilter};

/// Page source serving canned markup, mutable from the test.
pub struct MockPageSource {
    url: RwLock<String>,
    html: RwLock<String>,
    fail: AtomicBool,
    snapshots: AtomicUsize,
}

impl MockPageSource {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
            html: RwLock::new(html.into()),
            fail: AtomicBool::new(false),
            snapshots: AtomicUsize::new(0),
        }
    }

    /// Simulate an in-page navigation.
    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write().unwrap() = url.into();
    }

    /// Replace the page markup, as if the app re-rendered.
    pub fn set_html(&self, html: impl Into<String>) {
        *self.html.write().unwrap() = html.into();
    }

    /// Make subsequent snapshots fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// How many snapshots have been taken.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn snapshot(&self) -> std::result::Result<PageSnapshot, PageError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PageError::Unavailable("mock page set to fail".to_string()));
        }
        Ok(PageSnapshot::new(
            self.url.read().unwrap().clone(),
            self.html.read().unwrap().clone(),
        ))
    }
}

/// Store wrapper that fails selected operations on demand.
pub struct FlakyStore<S> {
    inner: S,
    fail_find_by_url: AtomicBool,
    fail_delete: AtomicBool,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_find_by_url: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    pub fn fail_find_by_url(&self, failing: bool) {
        self.fail_find_by_url.store(failing, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, failing: bool) {
        self.fail_delete.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: ConversationStore> ConversationStore for FlakyStore<S> {
    async fn save(&self, conversation: &Conversation) -> Result<String> {
        self.inner.save(conversation).await
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        self.inner.get(id).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Conversation>> {
        if self.fail_find_by_url.load(Ordering::SeqCst) {
            return Err(CaptureError::storage_msg("injected find_by_url failure"));
        }
        self.inner.find_by_url(url).await
    }

    async fn list(&self, filter: Option<&ConversationFilter>) -> Result<Vec<Conversation>> {
        self.inner.list(filter).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CaptureError::storage_msg("injected delete failure"));
        }
        self.inner.delete(id).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}

/// Build a ChatGPT-shaped page from a list of turns.
pub fn chatgpt_page(turns: &[(Actor, &str)]) -> String {
    let mut body = String::new();
    for (actor, content) in turns {
        let role = match actor {
            Actor::User => "user",
            Actor::Assistant => "assistant",
        };
        body.push_str(&format!(
            r#"<div data-message-author-role="{role}"><div class="markdown">{content}</div></div>"#,
        ));
        body.push('\n');
    }
    format!("<html><body><main>{body}</main></body></html>")
}

/// Build a Claude-shaped page from a list of turns.
pub fn claude_page(turns: &[(Actor, &str)]) -> String {
    let mut body = String::new();
    for (actor, content) in turns {
        let class = match actor {
            Actor::User => "human-message",
            Actor::Assistant => "claude-message",
        };
        body.push_str(&format!(r#"<div class="{class}">{content}</div>"#));
        body.push('\n');
    }
    format!("<html><body><main>{body}</main></body></html>")
}
