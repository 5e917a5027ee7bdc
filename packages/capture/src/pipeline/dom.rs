//! Small helpers over `scraper` for working with untrusted page markup.

use scraper::{ElementRef, Selector};
use tracing::warn;

/// Parse a selector from a profile table.
///
/// Profile selectors are static data, but they target third-party markup
/// and get edited often; a bad one is skipped with a warning rather than
/// taking the whole pass down.
pub(crate) fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            warn!(selector = css, error = ?err, "invalid selector, skipping");
            None
        }
    }
}

/// Collapse runs of whitespace the way `textContent`-based scrapers do.
fn collapse_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text under an element, HTML stripped, whitespace collapsed.
pub(crate) fn element_text(el: ElementRef) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

/// Only the element's immediate text nodes, skipping child elements.
///
/// Used by the long-content guard to stop one container's text from
/// bleeding across turns.
pub(crate) fn direct_text(el: ElementRef) -> String {
    let joined = el
        .children()
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect::<Vec<_>>()
        .join(" ");
    collapse_ws(&joined)
}

/// First non-empty text found by a prioritized list of selectors.
pub(crate) fn first_text_by_selectors(el: ElementRef, selectors: &[&str]) -> Option<String> {
    for css in selectors {
        let Some(selector) = parse_selector(css) else {
            continue;
        };
        if let Some(found) = el.select(&selector).next() {
            let text = element_text(found);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Whether the element or any ancestor carries a class.
pub(crate) fn has_class_here_or_above(el: ElementRef, class: &str) -> bool {
    if el.value().classes().any(|c| c == class) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|anc| anc.value().classes().any(|c| c == class))
}

/// Attribute value from the element or its nearest ancestor carrying it.
pub(crate) fn attr_here_or_above(el: ElementRef, attr: &str) -> Option<String> {
    if let Some(value) = el.value().attr(attr) {
        return Some(value.to_string());
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find_map(|anc| anc.value().attr(attr).map(str::to_string))
}

/// Index of the element among its parent's element children.
pub(crate) fn sibling_index(el: ElementRef) -> Option<usize> {
    let parent = el.parent()?;
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .position(|sibling| sibling.id() == el.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first_div(doc: &Html) -> ElementRef<'_> {
        let sel = Selector::parse("div").unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn test_element_text_strips_markup() {
        let doc = Html::parse_fragment("<div>Hello <b>bold</b>\n  world</div>");
        assert_eq!(element_text(first_div(&doc)), "Hello bold world");
    }

    #[test]
    fn test_direct_text_skips_child_elements() {
        let doc = Html::parse_fragment("<div>mine <span>not mine</span> also mine</div>");
        assert_eq!(direct_text(first_div(&doc)), "mine also mine");
    }

    #[test]
    fn test_attr_here_or_above_prefers_self() {
        let doc = Html::parse_fragment(
            r#"<div data-role="assistant"><div id="inner" data-role="user">x</div></div>"#,
        );
        let sel = Selector::parse("#inner").unwrap();
        let inner = doc.select(&sel).next().unwrap();
        assert_eq!(attr_here_or_above(inner, "data-role").as_deref(), Some("user"));
    }

    #[test]
    fn test_sibling_index_counts_elements_only() {
        let doc = Html::parse_fragment("<div><p>a</p>text<p id='b'>b</p></div>");
        let sel = Selector::parse("#b").unwrap();
        let b = doc.select(&sel).next().unwrap();
        assert_eq!(sibling_index(b), Some(1));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        assert!(parse_selector("p:::!bad").is_none());
        assert!(parse_selector(".fine").is_some());
    }
}
