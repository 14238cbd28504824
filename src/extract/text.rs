//! Text and element helpers shared by the extraction strategies

use regex::Regex;
use scraper::{ElementRef, Node, Selector};

/// Compiles a fixed selector list, dropping entries that fail to parse
pub(crate) fn compile(patterns: &[&str]) -> Vec<Selector> {
    patterns
        .iter()
        .filter_map(|pattern| Selector::parse(pattern).ok())
        .collect()
}

/// Compiles a single fixed selector
pub(crate) fn selector(pattern: &str) -> Option<Selector> {
    Selector::parse(pattern).ok()
}

/// Text of an element with whitespace runs collapsed and ends trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of an element exactly as it appears in the markup
pub(crate) fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `text`
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// The element's single string, if its content is exactly one text run
///
/// An element qualifies when it has exactly one child and that child is
/// either a text node or an element that qualifies in turn.
pub(crate) fn direct_string(element: ElementRef<'_>) -> Option<String> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }

    match only.value() {
        Node::Text(text) => Some(text.to_string()),
        Node::Element(_) => ElementRef::wrap(only).and_then(direct_string),
        _ => None,
    }
}

/// Returns true if any class of the element matches `pattern`
pub(crate) fn has_class_matching(element: ElementRef<'_>, pattern: &Regex) -> bool {
    element.value().classes().any(|class| pattern.is_match(class))
}

/// First match of `selector` inside `scope`
pub(crate) fn select_first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// First non-empty value among the given attributes
pub(crate) fn first_attr(element: ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// First match of any pattern in order; a capture group wins over the full match
pub(crate) fn first_pattern_match(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern.captures(text).map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
    })
}
