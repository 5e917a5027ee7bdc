//! Filtering for stored conversation listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::conversation::Conversation;
use crate::types::platform::Platform;

/// Filter for scoping conversation listings by source, date, or text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationFilter {
    /// Only conversations from this platform (exact match).
    pub source_chatbot: Option<Platform>,

    /// Only conversations created at or after this instant.
    pub from_date: Option<DateTime<Utc>>,

    /// Only conversations created at or before this instant.
    pub to_date: Option<DateTime<Utc>>,

    /// Case-insensitive substring search over interaction content
    /// and the conversation URL.
    pub search_text: Option<String>,
}

impl ConversationFilter {
    /// Create a new empty filter (matches all).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter to a single platform.
    pub fn for_source(platform: Platform) -> Self {
        Self {
            source_chatbot: Some(platform),
            ..Default::default()
        }
    }

    /// Set the lower date bound (inclusive).
    pub fn with_from_date(mut self, date: DateTime<Utc>) -> Self {
        self.from_date = Some(date);
        self
    }

    /// Set the upper date bound (inclusive).
    pub fn with_to_date(mut self, date: DateTime<Utc>) -> Self {
        self.to_date = Some(date);
        self
    }

    /// Set the free-text search.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Check whether a conversation passes this filter.
    pub fn matches(&self, conversation: &Conversation) -> bool {
        if let Some(source) = self.source_chatbot {
            if conversation.source_chatbot != source {
                return false;
            }
        }

        if let Some(from) = self.from_date {
            if conversation.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if conversation.timestamp > to {
                return false;
            }
        }

        if let Some(text) = &self.search_text {
            let needle = text.to_lowercase();
            let in_content = conversation
                .interactions
                .iter()
                .any(|u| u.content.to_lowercase().contains(&needle));
            let in_url = conversation
                .conversation_url
                .to_lowercase()
                .contains(&needle);
            if !in_content && !in_url {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::conversation::{Actor, Utterance};
    use chrono::Duration;

    fn conversation(platform: Platform, content: &str) -> Conversation {
        let mut conv = Conversation::shell(platform, "https://example.com/chat/1");
        conv.interactions.push(Utterance::new(Actor::User, content));
        conv
    }

    #[test]
    fn test_source_filter_is_exact() {
        let claude = conversation(Platform::Claude, "hi");
        let chatgpt = conversation(Platform::ChatGpt, "hi");

        let filter = ConversationFilter::for_source(Platform::Claude);
        assert!(filter.matches(&claude));
        assert!(!filter.matches(&chatgpt));
    }

    #[test]
    fn test_date_range_excludes_strictly_outside() {
        let conv = conversation(Platform::Poe, "hi");
        let before = conv.timestamp - Duration::hours(1);
        let after = conv.timestamp + Duration::hours(1);

        assert!(ConversationFilter::new().with_from_date(before).matches(&conv));
        assert!(!ConversationFilter::new().with_from_date(after).matches(&conv));
        assert!(ConversationFilter::new().with_to_date(after).matches(&conv));
        assert!(!ConversationFilter::new().with_to_date(before).matches(&conv));
        // Boundary is inclusive
        assert!(ConversationFilter::new()
            .with_from_date(conv.timestamp)
            .with_to_date(conv.timestamp)
            .matches(&conv));
    }

    #[test]
    fn test_search_matches_content_and_url() {
        let conv = conversation(Platform::Gemini, "the quick brown fox");
        assert!(ConversationFilter::new().with_search("BROWN").matches(&conv));
        assert!(ConversationFilter::new().with_search("example.com").matches(&conv));
        assert!(!ConversationFilter::new().with_search("zebra").matches(&conv));
    }
}
