//! Conversation records - the aggregate captured from a chat page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::platform::Platform;

/// Generate an opaque unique id for conversations and attachments.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    Assistant,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User => f.write_str("user"),
            Actor::Assistant => f.write_str("assistant"),
        }
    }
}

/// A file attached to an utterance.
///
/// The binary itself is never fetched (not accessible cross-origin), so
/// `reference` carries the filename as a stand-in locator and `mimetype`
/// defaults to a generic binary type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Opaque unique id, generated fresh at extraction time
    pub id: String,

    /// Filename as shown in the page, `"file"` when absent
    pub filename: String,

    /// Best-effort MIME type
    pub mimetype: String,

    /// Stand-in locator (the filename)
    pub reference: String,

    /// Id of the owning conversation
    pub conversation_id: String,
}

impl Attachment {
    /// Default MIME type when the real one is unknowable.
    pub const GENERIC_MIMETYPE: &'static str = "application/octet-stream";

    /// Create an attachment for a conversation, with a fresh id.
    pub fn new(filename: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: new_id(),
            reference: filename.clone(),
            filename,
            mimetype: Self::GENERIC_MIMETYPE.to_string(),
            conversation_id: conversation_id.into(),
        }
    }
}

/// One turn of dialogue attributed to the user or the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    /// Who said it
    pub actor: Actor,

    /// Capture time, not true send time (the DOM rarely exposes it)
    pub timestamp: DateTime<Utc>,

    /// Plain text content, HTML stripped; never empty
    pub content: String,

    /// Attached files, possibly empty
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Utterance {
    /// Number of leading content characters that feed the fingerprint.
    pub const FINGERPRINT_PREFIX: usize = 100;

    /// Create an utterance captured now.
    pub fn new(actor: Actor, content: impl Into<String>) -> Self {
        Self {
            actor,
            timestamp: Utc::now(),
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Attach files.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Cheap duplicate key: actor plus the first 100 content characters.
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.content.chars().take(Self::FINGERPRINT_PREFIX).collect();
        format!("{}:{}", self.actor, prefix)
    }
}

/// A captured conversation, keyed for merging by its source URL.
///
/// At most one stored conversation exists per distinct `conversation_url`;
/// later captures supersede earlier ones with the same URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Opaque unique token
    pub id: String,

    /// Platform the conversation was captured from
    pub source_chatbot: Platform,

    /// Creation time, set once per shell
    pub timestamp: DateTime<Utc>,

    /// Page URL at capture time; the natural merge key
    pub conversation_url: String,

    /// Best-effort model name shown by the platform UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_model_requested: Option<String>,

    /// Ordered turns, replaced wholesale on every extraction pass
    #[serde(default)]
    pub interactions: Vec<Utterance>,
}

impl Conversation {
    /// Create an empty shell bound to a page.
    ///
    /// Shells get a fresh id and creation timestamp; a later merge may
    /// replace the id with a previously stored conversation's id.
    pub fn shell(platform: Platform, url: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            source_chatbot: platform,
            timestamp: Utc::now(),
            conversation_url: url.into(),
            target_model_requested: None,
            interactions: Vec::new(),
        }
    }

    /// Adopt an id, re-tagging every attachment's owning-conversation id.
    ///
    /// Attachments reference their conversation by id; skipping the re-tag
    /// when an id is carried over would orphan them.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        for utterance in &mut self.interactions {
            for attachment in &mut utterance.attachments {
                attachment.conversation_id = id.clone();
            }
        }
        self.id = id;
    }

    /// True when no turns have been captured yet.
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Count turns for one actor.
    pub fn count_by_actor(&self, actor: Actor) -> usize {
        self.interactions.iter().filter(|u| u.actor == actor).count()
    }
}
