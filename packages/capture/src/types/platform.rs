//! Supported conversational-assistant platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported chat platform.
///
/// Serialized as the product name (`"ChatGPT"`, `"Claude"`, ...) so that
/// stored conversations and export files stay readable and stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "ChatGPT")]
    ChatGpt,
    Claude,
    Gemini,
    Poe,
    Perplexity,
}

impl Platform {
    /// All supported platforms, in detection order.
    pub const ALL: [Platform; 5] = [
        Platform::ChatGpt,
        Platform::Claude,
        Platform::Gemini,
        Platform::Poe,
        Platform::Perplexity,
    ];

    /// The display name used in serialized records.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::ChatGpt => "ChatGPT",
            Platform::Claude => "Claude",
            Platform::Gemini => "Gemini",
            Platform::Poe => "Poe",
            Platform::Perplexity => "Perplexity",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chatgpt" => Ok(Platform::ChatGpt),
            "claude" => Ok(Platform::Claude),
            "gemini" => Ok(Platform::Gemini),
            "poe" => Ok(Platform::Poe),
            "perplexity" => Ok(Platform::Perplexity),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&Platform::ChatGpt).unwrap();
        assert_eq!(json, "\"ChatGPT\"");

        let back: Platform = serde_json::from_str("\"Claude\"").unwrap();
        assert_eq!(back, Platform::Claude);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("ChatGPT".parse::<Platform>().unwrap(), Platform::ChatGpt);
        assert_eq!("claude".parse::<Platform>().unwrap(), Platform::Claude);
        assert!("copilot".parse::<Platform>().is_err());
    }
}
