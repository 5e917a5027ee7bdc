//! Platform detection from the page URL.

use crate::types::Platform;

/// Host fragments mapped to platform ids, checked in order.
const DETECTION_TABLE: &[(&str, Platform)] = &[
    ("chat.openai.com", Platform::ChatGpt),
    ("chatgpt.com", Platform::ChatGpt),
    ("claude.ai", Platform::Claude),
    ("gemini.google.com", Platform::Gemini),
    ("bard.google.com", Platform::Gemini),
    ("poe.com", Platform::Poe),
    ("perplexity.ai", Platform::Perplexity),
];

/// Map a page URL to a supported platform.
///
/// Pure substring match against a fixed table; no network or DOM access.
/// `None` means "do not activate any capture behavior on this page".
pub fn detect_platform(url: &str) -> Option<Platform> {
    DETECTION_TABLE
        .iter()
        .find(|(fragment, _)| url.contains(fragment))
        .map(|(_, platform)| *platform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_all_supported_platforms() {
        let cases = [
            ("https://chat.openai.com/c/123", Platform::ChatGpt),
            ("https://chatgpt.com/c/456", Platform::ChatGpt),
            ("https://claude.ai/chat/abc-def", Platform::Claude),
            ("https://gemini.google.com/app/789", Platform::Gemini),
            ("https://bard.google.com/chat", Platform::Gemini),
            ("https://poe.com/chat/xyz", Platform::Poe),
            ("https://www.perplexity.ai/search/q", Platform::Perplexity),
        ];
        for (url, expected) in cases {
            assert_eq!(detect_platform(url), Some(expected), "url: {url}");
        }
    }

    #[test]
    fn test_unrelated_urls_detect_nothing() {
        assert_eq!(detect_platform("https://example.com"), None);
        assert_eq!(detect_platform("https://news.ycombinator.com/item?id=1"), None);
        assert_eq!(detect_platform(""), None);
    }
}
