//! Read-only view over the live page being captured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PageError;

/// A point-in-time copy of the page: its URL and serialized DOM.
///
/// Extraction works on snapshots rather than a live handle so a pass sees
/// one consistent document even while the page keeps re-rendering.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// The page URL at snapshot time
    pub url: String,

    /// Serialized document markup
    pub html: String,

    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
}

impl PageSnapshot {
    /// Create a snapshot taken now.
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            captured_at: Utc::now(),
        }
    }
}

/// Source of page snapshots.
///
/// Implemented by the host glue that talks to the real page; the library
/// only ever reads through this seam.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Take a snapshot of the current page.
    async fn snapshot(&self) -> Result<PageSnapshot, PageError>;
}

#[async_trait]
impl<P: PageSource + ?Sized> PageSource for std::sync::Arc<P> {
    async fn snapshot(&self) -> Result<PageSnapshot, PageError> {
        (**self).snapshot().await
    }
}
