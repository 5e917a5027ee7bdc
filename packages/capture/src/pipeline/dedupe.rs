//! Duplicate suppression for extracted utterances.
//!
//! Chat pages render the same turn several ways (streaming shells,
//! quoted echoes, sticky previews), so a raw extraction pass routinely
//! yields near-copies. Two passes run here: an in-pass check combining
//! exact matches with Jaccard token similarity, and a cheaper
//! fingerprint sweep applied right before a conversation is stored.

use std::collections::HashSet;

use crate::types::Utterance;

/// Both sides of a near-match comparison must be at least this long.
/// Short texts ("Yes.", "Thanks!") legitimately repeat.
const NEAR_MATCH_MIN_CHARS: usize = 30;

/// Similarity strictly above this is treated as a duplicate.
const SIMILARITY_THRESHOLD: f32 = 0.85;

/// Long texts are compared on their leading slice only.
const MAX_COMPARE_CHARS: usize = 1000;

/// Tokens at or below this length are ignored when comparing.
const MIN_TOKEN_CHARS: usize = 3;

/// Jaccard similarity over the significant-token sets of two texts.
///
/// Texts are truncated to [`MAX_COMPARE_CHARS`], lowercased, and split
/// on whitespace; tokens of [`MIN_TOKEN_CHARS`] or fewer characters are
/// dropped. Returns 0.0 when neither side has a significant token.
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let tokens_a = significant_tokens(a);
    let tokens_b = significant_tokens(b);

    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    intersection as f32 / union as f32
}

fn significant_tokens(text: &str) -> HashSet<String> {
    let head: String = text.chars().take(MAX_COMPARE_CHARS).collect();
    head.to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Whether `candidate` duplicates anything already accepted.
///
/// Exact actor-and-content matches are duplicates regardless of length.
/// Near matches require the same actor, both contents past
/// [`NEAR_MATCH_MIN_CHARS`], and similarity strictly above
/// [`SIMILARITY_THRESHOLD`].
pub fn is_duplicate(accepted: &[Utterance], candidate: &Utterance) -> bool {
    accepted.iter().any(|existing| {
        if existing.actor != candidate.actor {
            return false;
        }
        if existing.content == candidate.content {
            return true;
        }
        existing.content.chars().count() >= NEAR_MATCH_MIN_CHARS
            && candidate.content.chars().count() >= NEAR_MATCH_MIN_CHARS
            && jaccard_similarity(&existing.content, &candidate.content) > SIMILARITY_THRESHOLD
    })
}

/// Filter a freshly extracted list down to non-duplicates, keeping the
/// first occurrence of each and preserving order.
pub fn dedupe_pass(utterances: Vec<Utterance>) -> Vec<Utterance> {
    let mut accepted: Vec<Utterance> = Vec::with_capacity(utterances.len());
    for utterance in utterances {
        if !is_duplicate(&accepted, &utterance) {
            accepted.push(utterance);
        }
    }
    accepted
}

/// Drop utterances whose fingerprint was already seen, keeping the
/// first occurrence. Runs just before a conversation is persisted.
pub fn dedupe_by_fingerprint(utterances: Vec<Utterance>) -> Vec<Utterance> {
    let mut seen = HashSet::new();
    utterances
        .into_iter()
        .filter(|utterance| seen.insert(utterance.fingerprint()))
        .collect()
}
