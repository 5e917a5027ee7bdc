//! Tiered message extraction from a page snapshot.
//!
//! Each platform profile lists extraction tiers in priority order; a
//! tier runs only when every tier above it found nothing. Within a
//! tier, one malformed element never aborts the pass: per-element
//! failures are logged and skipped, and the pass returns whatever was
//! successfully extracted.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::error::ElementError;
use crate::pipeline::dom::{
    attr_here_or_above, direct_text, element_text, first_text_by_selectors,
    has_class_here_or_above, parse_selector, sibling_index,
};
use crate::pipeline::profiles::{ActorRules, ModelRule, PlatformProfile, Tier};
use crate::types::{Actor, Attachment, Utterance};

/// Elements with less text than this are not messages.
pub const MIN_CONTENT_CHARS: usize = 5;

/// Content longer than this triggers the direct-text narrowing guard.
pub const LONG_CONTENT_GUARD_CHARS: usize = 500;

/// Narrowed direct text must beat this length to replace the content.
pub const DIRECT_TEXT_MIN_CHARS: usize = 30;

/// Minimum length for a last-resort text block.
pub const TEXT_BLOCK_MIN_CHARS: usize = 30;

/// Last-resort selector: anything that usually holds visible prose.
const TEXT_BLOCK_SELECTOR: &str = "p, div > span";

/// Extract candidate utterances from a parsed page.
///
/// Output is ordered by capture timestamp; the sort is stable, so equal
/// timestamps keep DOM encounter order. Attachments found on the way are
/// tagged with `conversation_id`.
pub fn extract_messages(
    profile: &PlatformProfile,
    document: &Html,
    conversation_id: &str,
) -> Vec<Utterance> {
    for (index, tier) in profile.tiers.iter().enumerate() {
        let mut utterances = run_tier(profile, tier, document, conversation_id);
        if utterances.is_empty() {
            debug!(platform = %profile.platform, tier = index, "tier found nothing, falling through");
            continue;
        }
        utterances.sort_by_key(|u| u.timestamp);
        return utterances;
    }
    Vec::new()
}

/// Best-effort model name from the page. Never fatal.
pub fn extract_model(profile: &PlatformProfile, document: &Html) -> Option<String> {
    match &profile.model {
        ModelRule::Fixed(label) => Some((*label).to_string()),
        ModelRule::Selectors(css) => {
            let selector = parse_selector(css)?;
            let found = document.select(&selector).next()?;
            let text = element_text(found);
            (!text.is_empty()).then_some(text)
        }
    }
}

fn run_tier(
    profile: &PlatformProfile,
    tier: &Tier,
    document: &Html,
    conversation_id: &str,
) -> Vec<Utterance> {
    match tier {
        Tier::Roles {
            user,
            user_content,
            assistant,
            assistant_content,
        } => {
            let mut utterances = role_side(profile, document, user, user_content, Actor::User, conversation_id);
            utterances.extend(role_side(
                profile,
                document,
                assistant,
                assistant_content,
                Actor::Assistant,
                conversation_id,
            ));
            utterances
        }
        Tier::Mixed { selector } => mixed_tier(profile, document, selector, conversation_id),
        Tier::TextBlocks => text_blocks(document),
    }
}

/// One side of a role-known tier: every element is the given actor.
fn role_side(
    profile: &PlatformProfile,
    document: &Html,
    selector: &str,
    content_selectors: &[&str],
    actor: Actor,
    conversation_id: &str,
) -> Vec<Utterance> {
    let Some(selector) = parse_selector(selector) else {
        return Vec::new();
    };

    let mut utterances = Vec::new();
    for element in document.select(&selector) {
        match role_element(profile, element, content_selectors, actor, conversation_id) {
            Ok(utterance) => utterances.push(utterance),
            Err(err) => debug!(actor = %actor, error = %err, "skipping candidate"),
        }
    }
    utterances
}

fn role_element(
    profile: &PlatformProfile,
    element: ElementRef,
    content_selectors: &[&str],
    actor: Actor,
    conversation_id: &str,
) -> Result<Utterance, ElementError> {
    let content =
        first_text_by_selectors(element, content_selectors).ok_or(ElementError::EmptyContent)?;
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(ElementError::EmptyContent);
    }
    let attachments = extract_attachments(profile, element, conversation_id);
    Ok(Utterance::new(actor, content).with_attachments(attachments))
}

/// A tier of elements whose actor must be resolved per element.
fn mixed_tier(
    profile: &PlatformProfile,
    document: &Html,
    selector: &str,
    conversation_id: &str,
) -> Vec<Utterance> {
    let Some(selector) = parse_selector(selector) else {
        return Vec::new();
    };

    let mut utterances = Vec::new();
    for element in document.select(&selector) {
        match mixed_element(profile, element, conversation_id) {
            Ok(utterance) => utterances.push(utterance),
            Err(err) => debug!(error = %err, "skipping candidate"),
        }
    }
    utterances
}

fn mixed_element(
    profile: &PlatformProfile,
    element: ElementRef,
    conversation_id: &str,
) -> Result<Utterance, ElementError> {
    let full_text = element_text(element);
    if full_text.chars().count() < MIN_CONTENT_CHARS {
        return Err(ElementError::EmptyContent);
    }

    let actor = classify_actor(&profile.actor_rules, element, &full_text)
        .ok_or(ElementError::Unclassifiable)?;

    // Prefer the most specific content node over the container's full
    // text; containers often include nested chrome or multiple turns.
    let mut content =
        first_text_by_selectors(element, profile.content_selectors).unwrap_or(full_text);

    if content.chars().count() > LONG_CONTENT_GUARD_CHARS {
        let narrowed = direct_text(element);
        if narrowed.chars().count() > DIRECT_TEXT_MIN_CHARS {
            content = narrowed;
        }
    }

    if content.is_empty() {
        return Err(ElementError::EmptyContent);
    }

    let attachments = extract_attachments(profile, element, conversation_id);
    Ok(Utterance::new(actor, content).with_attachments(attachments))
}

/// Resolve an element's actor. Rules in priority order; the first that
/// yields a definite answer wins, and an element none of them resolve
/// is dropped by the caller.
fn classify_actor(rules: &ActorRules, element: ElementRef, text: &str) -> Option<Actor> {
    // (a) explicit role attributes, on the element or an ancestor
    for role_attr in rules.role_attrs {
        if let Some(value) = attr_here_or_above(element, role_attr.attr) {
            if value == role_attr.user_value {
                return Some(Actor::User);
            }
            if value == role_attr.assistant_value {
                return Some(Actor::Assistant);
            }
        }
    }

    // (b) container class names
    for class in rules.user_classes {
        if has_class_here_or_above(element, class) {
            return Some(Actor::User);
        }
    }
    for class in rules.assistant_classes {
        if has_class_here_or_above(element, class) {
            return Some(Actor::Assistant);
        }
    }

    // A user-content descendant marks a user container (Gemini turn
    // containers); its absence says nothing.
    if let Some(probe) = rules.user_probe {
        if let Some(selector) = parse_selector(probe) {
            if element.select(&selector).next().is_some() {
                return Some(Actor::User);
            }
        }
    }

    // (c) leading text markers
    for prefix in rules.user_prefixes {
        if text.starts_with(prefix) {
            return Some(Actor::User);
        }
    }
    for prefix in rules.assistant_prefixes {
        if text.starts_with(prefix) {
            return Some(Actor::Assistant);
        }
    }

    // (d) positional parity; turns alternate in most chat UIs and the
    // first element is typically the assistant's
    if rules.positional_parity {
        if let Some(index) = sibling_index(element) {
            return Some(if index % 2 == 1 {
                Actor::User
            } else {
                Actor::Assistant
            });
        }
    }

    None
}

/// Attachment-like child nodes with a best-effort filename.
fn extract_attachments(
    profile: &PlatformProfile,
    element: ElementRef,
    conversation_id: &str,
) -> Vec<Attachment> {
    if profile.attachments.containers.is_empty() {
        return Vec::new();
    }
    let Some(containers) = parse_selector(profile.attachments.containers) else {
        return Vec::new();
    };
    let name_selector = parse_selector(profile.attachments.name);

    element
        .select(&containers)
        .map(|container| {
            let filename = name_selector
                .as_ref()
                .and_then(|sel| container.select(sel).next())
                .map(element_text)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "file".to_string());
            Attachment::new(filename, conversation_id)
        })
        .collect()
}

/// Last-resort tier: all sufficiently long text blocks, actors
/// alternating by position starting with the user.
fn text_blocks(document: &Html) -> Vec<Utterance> {
    let Some(selector) = parse_selector(TEXT_BLOCK_SELECTOR) else {
        warn!("text block selector failed to parse");
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|text| text.chars().count() > TEXT_BLOCK_MIN_CHARS)
        .enumerate()
        .map(|(index, text)| {
            let actor = if index % 2 == 0 {
                Actor::User
            } else {
                Actor::Assistant
            };
            Utterance::new(actor, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::profiles::profile;
    use crate::types::Platform;

    const CONV: &str = "conv-1";

    fn chatgpt() -> &'static PlatformProfile {
        profile(Platform::ChatGpt)
    }

    #[test]
    fn test_alternating_turns_extract_in_page_order() {
        let html = Html::parse_document(
            r#"
            <main>
              <div data-message-author-role="user">What is the capital of France?</div>
              <div data-message-author-role="assistant">The capital of France is Paris.</div>
              <div data-message-author-role="user">And of Germany, which city is it?</div>
              <div data-message-author-role="assistant">Germany's capital city is Berlin.</div>
              <div data-message-author-role="user">Thanks, one more: Italy please?</div>
              <div data-message-author-role="assistant">Italy's capital city is Rome.</div>
            </main>
            "#,
        );

        let utterances = extract_messages(chatgpt(), &html, CONV);
        assert_eq!(utterances.len(), 6);
        for (i, u) in utterances.iter().enumerate() {
            let expected = if i % 2 == 0 { Actor::User } else { Actor::Assistant };
            assert_eq!(u.actor, expected, "turn {i}");
        }
        assert!(utterances[0].content.contains("capital of France"));
        assert!(utterances[5].content.contains("Rome"));
    }

    #[test]
    fn test_lower_tier_runs_only_when_higher_tiers_find_nothing() {
        // No role/testid attributes anywhere, so tier 1 is empty and the
        // looser class-based tier 2 picks the messages up.
        let html = Html::parse_document(
            r#"
            <div class="text-message user">Please summarize this document for me.</div>
            <div class="text-message assistant">Here is a short summary of the text.</div>
            "#,
        );

        let utterances = extract_messages(chatgpt(), &html, CONV);
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].actor, Actor::User);
        assert_eq!(utterances[1].actor, Actor::Assistant);
    }

    #[test]
    fn test_bad_candidate_does_not_abort_the_pass() {
        // The middle element matches the tier selector but carries no
        // usable text; the flanking candidates still come back.
        let html = Html::parse_document(
            r#"
            <div data-message-author-role="user">First question with enough text.</div>
            <div data-message-author-role="assistant">  </div>
            <div data-message-author-role="user">Second question with enough text.</div>
            "#,
        );

        let utterances = extract_messages(chatgpt(), &html, CONV);
        assert_eq!(utterances.len(), 2);
        assert!(utterances.iter().all(|u| u.actor == Actor::User));
    }

    #[test]
    fn test_unclassifiable_candidates_are_dropped() {
        let html = Html::parse_document(
            r#"<div class="message">No role markers anywhere in this one at all.</div>"#,
        );
        // Claude profile: `.message` matches but neither classes nor
        // prefixes resolve, and parity is off for Claude.
        let utterances = extract_messages(profile(Platform::Claude), &html, CONV);
        assert!(utterances.is_empty());
    }

    #[test]
    fn test_long_content_guard_narrows_to_direct_text() {
        let filler = "lorem ipsum dolor sit amet ".repeat(30);
        let html_src = format!(
            r#"<div class="human-message">This block keeps only its own immediate words here.
                 <div class="nested-chrome">{filler}</div></div>"#
        );
        let html = Html::parse_document(&html_src);

        let utterances = extract_messages(profile(Platform::Claude), &html, CONV);
        assert_eq!(utterances.len(), 1);
        assert!(utterances[0].content.contains("immediate words"));
        assert!(!utterances[0].content.contains("lorem ipsum"));
    }

    #[test]
    fn test_attachments_get_filename_and_owner() {
        let html = Html::parse_document(
            r#"
            <div data-message-author-role="user">
              Here is the report you asked about yesterday.
              <div class="file-attachment"><span class="file-name">report-q3.pdf</span></div>
              <div class="file-attachment"></div>
            </div>
            "#,
        );

        let utterances = extract_messages(chatgpt(), &html, CONV);
        assert_eq!(utterances.len(), 1);
        let attachments = &utterances[0].attachments;
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].filename, "report-q3.pdf");
        assert_eq!(attachments[0].reference, "report-q3.pdf");
        assert_eq!(attachments[1].filename, "file");
        assert!(attachments.iter().all(|a| a.conversation_id == CONV));
        assert!(attachments.iter().all(|a| a.mimetype == Attachment::GENERIC_MIMETYPE));
    }

    #[test]
    fn test_role_tier_extracts_both_sides() {
        let html = Html::parse_document(
            r#"
            <user-query><div class="query-text">How do brown bears hibernate in winter?</div></user-query>
            <model-response><div class="response-content">They den up for months and live off fat reserves.</div></model-response>
            "#,
        );

        let utterances = extract_messages(profile(Platform::Gemini), &html, CONV);
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].actor, Actor::User);
        assert!(utterances[0].content.contains("hibernate"));
        assert_eq!(utterances[1].actor, Actor::Assistant);
        assert!(utterances[1].content.contains("fat reserves"));
    }

    #[test]
    fn test_text_block_fallback_alternates_actors() {
        let html = Html::parse_document(
            r#"
            <p>Could you explain how photosynthesis works in simple terms?</p>
            <p>Plants use sunlight to turn water and carbon dioxide into sugar.</p>
            <p>short</p>
            <p>And why exactly are most plant leaves green in color?</p>
            "#,
        );

        // Perplexity profile has no matches for tier 1 here.
        let utterances = extract_messages(profile(Platform::Perplexity), &html, CONV);
        assert_eq!(utterances.len(), 3);
        assert_eq!(utterances[0].actor, Actor::User);
        assert_eq!(utterances[1].actor, Actor::Assistant);
        assert_eq!(utterances[2].actor, Actor::User);
    }

    #[test]
    fn test_extract_model_selectors_and_fixed() {
        let html = Html::parse_document(r#"<nav><span class="model-name">GPT-4o</span></nav>"#);
        assert_eq!(extract_model(chatgpt(), &html).as_deref(), Some("GPT-4o"));

        let empty = Html::parse_document("<main></main>");
        assert_eq!(extract_model(chatgpt(), &empty), None);
        assert_eq!(
            extract_model(profile(Platform::Gemini), &empty).as_deref(),
            Some("Google Gemini")
        );
    }

    #[test]
    fn test_positional_parity_fallback() {
        // Gemini turn containers without data-role, classes, or user
        // content: parity alternates, odd indexes are the user.
        let html = Html::parse_document(
            r#"
            <main>
              <div id="r_one">Model greeting that opens the conversation window.</div>
              <div id="r_two">User reply asking about the weather today.</div>
            </main>
            "#,
        );

        let utterances = extract_messages(profile(Platform::Gemini), &html, CONV);
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].actor, Actor::Assistant);
        assert_eq!(utterances[1].actor, Actor::User);
    }
}
