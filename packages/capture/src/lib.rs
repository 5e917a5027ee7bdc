//! Chat conversation capture library.
//!
//! Turns serialized chat-page markup into structured, deduplicated
//! conversation records and keeps a store up to date as the page grows.
//! The host embedding this library supplies two things: a [`PageSource`]
//! that can snapshot the live page, and a [`ConversationStore`] to
//! persist into. Everything in between (platform detection, tiered
//! selector extraction, duplicate suppression, merge-by-URL persistence,
//! and the polling session loop) lives here.
//!
//! Typical embedding:
//!
//! ```no_run
//! use std::sync::Arc;
//! use capture::{CaptureSession, CaptureSettings, MemoryStore, SessionConfig};
//! use tokio::sync::watch;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn embed(page: impl capture::PageSource + 'static) -> capture::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let (_settings_tx, settings_rx) = watch::channel(CaptureSettings::default());
//! let (session, handle) = CaptureSession::new(page, store, settings_rx, SessionConfig::default());
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(session.run(cancel.clone()));
//! handle.capture_now().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{CaptureError, ElementError, PageError, Result};
pub use export::{export_conversations, import_conversations, ExportEnvelope};
pub use pipeline::{
    capture_pass, detect_platform, extract_messages, persist_conversation, profile,
    CaptureSession, SessionConfig, SessionHandle, SessionState,
};
pub use stores::MemoryStore;
pub use traits::{ConversationStore, PageSnapshot, PageSource};
pub use types::{
    Actor, Attachment, CaptureSettings, Conversation, ConversationFilter, Platform, Utterance,
};
