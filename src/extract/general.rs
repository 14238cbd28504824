//! Whole-page summary used when no layout heuristic matched

use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};

use super::text::{element_text, selector, truncate_chars};
use super::{Claims, ExtractionStrategy, Record};

const MAX_FULL_TEXT: usize = 5000;

/// Elements whose content is code or markup rather than text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static TITLE: Lazy<Option<Selector>> = Lazy::new(|| selector("title"));
static HEADING: Lazy<Option<Selector>> = Lazy::new(|| selector("h1"));
static META_DESCRIPTION: Lazy<Option<Selector>> =
    Lazy::new(|| selector(r#"meta[name="description"]"#));
static JSON_LD: Lazy<Option<Selector>> =
    Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Produces a single record describing the page as a whole
pub struct GeneralStrategy;

impl ExtractionStrategy for GeneralStrategy {
    fn name(&self) -> &'static str {
        "general"
    }

    fn extract<'a>(&self, document: &'a Html, _claims: &mut Claims<'a>) -> Vec<Record> {
        vec![summarize(document)]
    }
}

fn first_text(document: &Html, sel: &Lazy<Option<Selector>>) -> Option<String> {
    sel.as_ref()
        .and_then(|s| document.select(s).next())
        .map(element_text)
}

fn summarize(document: &Html) -> Record {
    let mut record = Record::new();

    if let Some(title) = first_text(document, &TITLE) {
        record.insert("title", title);
    }

    if let Some(heading) = first_text(document, &HEADING) {
        record.insert("heading", heading);
    }

    if let Some(meta) = META_DESCRIPTION
        .as_ref()
        .and_then(|s| document.select(s).next())
    {
        record.insert("description", meta.value().attr("content").unwrap_or_default());
    }

    record.insert("full_text", truncate_chars(&visible_text(document), MAX_FULL_TEXT));

    let structured = structured_data(document);
    if !structured.is_empty() {
        record.insert("structured_data", serde_json::Value::Array(structured));
    }

    record
}

/// Text of the whole page, including the title, joined by single spaces
fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }
    parts.join(" ")
}

/// Parses every JSON-LD block, skipping blocks that are not valid JSON
fn structured_data(document: &Html) -> Vec<serde_json::Value> {
    let Some(sel) = JSON_LD.as_ref() else {
        return Vec::new();
    };

    document
        .select(sel)
        .filter_map(|script| {
            let raw: String = script.text().collect();
            match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldValue;
    use serde_json::json;

    fn extract(html: &str) -> Vec<Record> {
        let document = Html::parse_document(html);
        GeneralStrategy.extract(&document, &mut Claims::new())
    }

    #[test]
    fn test_page_summary() {
        let records = extract(
            r#"<html><head>
                 <title>About Us</title>
                 <meta name="description" content="Who we are">
                 <style>body { color: red; }</style>
                 <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
                 <script type="application/ld+json">{ not json</script>
               </head>
               <body>
                 <h1>About   Acme</h1>
                 <script>var hidden = 1;</script>
                 <p>We build
                    things.</p>
               </body></html>"#,
        );

        assert_eq!(records.len(), 1);
        let page = &records[0];
        assert_eq!(page.text("title"), Some("About Us"));
        assert_eq!(page.text("heading"), Some("About Acme"));
        assert_eq!(page.text("description"), Some("Who we are"));
        assert_eq!(
            page.text("full_text"),
            Some("About Us About Acme We build things.")
        );
        assert_eq!(
            page.get("structured_data"),
            Some(&FieldValue::Structured(json!([{"@type": "Organization", "name": "Acme"}])))
        );
    }

    #[test]
    fn test_full_text_is_capped() {
        let body = "word ".repeat(2000);
        let records = extract(&format!("<html><body><p>{}</p></body></html>", body));

        let full_text = records[0].text("full_text").unwrap();
        assert_eq!(full_text.chars().count(), MAX_FULL_TEXT);
    }

    #[test]
    fn test_empty_page_still_summarized() {
        let records = extract("<html><body></body></html>");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("full_text"), Some(""));
        assert!(!records[0].contains("title"));
    }
}
