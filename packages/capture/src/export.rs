//! JSON export and import of the whole archive.
//!
//! Exports wrap the conversations in a small envelope carrying the
//! export time and a count; imports validate the count against the
//! payload before accepting anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CaptureError, Result};
use crate::types::Conversation;

/// Envelope wrapping an exported archive.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    /// When the export was produced
    pub export_date: DateTime<Utc>,

    /// Number of conversations in the payload
    pub conversation_count: usize,

    /// The conversations themselves
    pub conversations: Vec<Conversation>,
}

/// Serialize conversations into a pretty-printed export document.
pub fn export_conversations(conversations: &[Conversation]) -> Result<String> {
    let envelope = ExportEnvelope {
        export_date: Utc::now(),
        conversation_count: conversations.len(),
        conversations: conversations.to_vec(),
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    info!(count = envelope.conversation_count, "exported conversations");
    Ok(json)
}

/// Parse and validate an export document.
///
/// Rejects envelopes whose declared count disagrees with the payload,
/// which catches truncated or hand-edited files early.
pub fn import_conversations(json: &str) -> Result<Vec<Conversation>> {
    let envelope: ExportEnvelope = serde_json::from_str(json)?;
    if envelope.conversation_count != envelope.conversations.len() {
        return Err(CaptureError::InvalidExport {
            reason: format!(
                "declared count {} but payload holds {}",
                envelope.conversation_count,
                envelope.conversations.len()
            ),
        });
    }
    info!(count = envelope.conversation_count, "imported conversations");
    Ok(envelope.conversations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, Platform, Utterance};

    fn sample() -> Conversation {
        let mut c = Conversation::shell(Platform::Gemini, "https://gemini.google.com/app/1");
        c.target_model_requested = Some("Google Gemini".to_string());
        c.interactions
            .push(Utterance::new(Actor::User, "What changed in this release?"));
        c
    }

    #[test]
    fn test_export_then_import_preserves_conversations() {
        let original = sample();
        let json = export_conversations(std::slice::from_ref(&original)).unwrap();

        let imported = import_conversations(&json).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].id, original.id);
        assert_eq!(imported[0].source_chatbot, original.source_chatbot);
        assert_eq!(imported[0].timestamp, original.timestamp);
        assert_eq!(imported[0].conversation_url, original.conversation_url);
        assert_eq!(imported[0].target_model_requested, original.target_model_requested);
        assert_eq!(imported[0].interactions[0].content, original.interactions[0].content);
    }

    #[test]
    fn test_envelope_uses_expected_keys() {
        let json = export_conversations(&[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("exportDate").is_some());
        assert_eq!(value.get("conversationCount").unwrap(), 1);
        assert!(value.get("conversations").unwrap().is_array());
    }

    #[test]
    fn test_mismatched_count_is_rejected() {
        let json = r#"{"exportDate":"2025-01-01T00:00:00Z","conversationCount":3,"conversations":[]}"#;
        let err = import_conversations(json).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidExport { .. }));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = import_conversations("{not json").unwrap_err();
        assert!(matches!(err, CaptureError::JsonParse(_)));
    }
}
