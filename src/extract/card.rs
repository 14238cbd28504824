//! Generic card and panel extraction

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::text::{
    collapse_whitespace, compile, direct_string, element_text, select_first, selector,
    truncate_chars,
};
use super::{Claims, ExtractionStrategy, Record};

const MAX_CARDS: usize = 100;
const MIN_CARD_TEXT: usize = 10;
const MAX_FRAGMENTS: usize = 10;
const MIN_FRAGMENT_LEN: usize = 3;
const MAX_FIELD_LEN: usize = 200;

static CONTAINER_PATTERNS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "div.card",
        "div.panel",
        "div.tile",
        "div.box",
        "div.module",
        "div.widget",
        r#"div[class*="card"]"#,
        r#"div[class*="item"]"#,
        r#"div[class*="col-"]"#,
    ])
});

static TITLE: Lazy<Option<Selector>> =
    Lazy::new(|| selector("h1, h2, h3, h4, h5, h6, strong, b"));
static TEXT_BLOCK: Lazy<Option<Selector>> = Lazy::new(|| selector("p, span, div"));
static IMAGE: Lazy<Option<Selector>> = Lazy::new(|| selector("img[src]"));
static LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a[href]"));

static CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$[\d,]+\.?\d*|£[\d,]+\.?\d*|€[\d,]+\.?\d*").expect("currency pattern")
});
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4}").expect("date pattern"));
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)@|email").expect("email pattern"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d{10,}|\(\d{3}\)").expect("phone pattern"));

/// Detects repeated card, panel or tile blocks
///
/// Elements an earlier heuristic already turned into records are skipped,
/// and a pattern is only used when more than two unclaimed elements match.
pub struct CardStrategy;

impl ExtractionStrategy for CardStrategy {
    fn name(&self) -> &'static str {
        "card"
    }

    fn extract<'a>(&self, document: &'a Html, claims: &mut Claims<'a>) -> Vec<Record> {
        let cards = CONTAINER_PATTERNS
            .iter()
            .map(|pattern| claims.unclaimed(document.select(pattern)))
            .find(|found| found.len() > 2)
            .unwrap_or_default();

        let mut records = Vec::new();
        for card in cards.into_iter().take(MAX_CARDS) {
            if element_text(card).chars().count() < MIN_CARD_TEXT {
                continue;
            }
            let record = extract_card(card);
            if !record.is_empty() {
                claims.claim(card);
                records.push(record);
            }
        }
        records
    }
}

/// Text fragments of elements whose whole content is a single string
fn text_fragments(card: ElementRef<'_>) -> Vec<String> {
    let Some(block) = TEXT_BLOCK.as_ref() else {
        return Vec::new();
    };

    let mut fragments: Vec<String> = Vec::new();
    for text in card
        .select(block)
        .filter_map(direct_string)
        .take(MAX_FRAGMENTS)
    {
        let text = collapse_whitespace(&text);
        if text.chars().count() > MIN_FRAGMENT_LEN && !fragments.contains(&text) {
            fragments.push(text);
        }
    }
    fragments
}

fn extract_card(card: ElementRef<'_>) -> Record {
    let mut record = Record::new();

    if let Some(title) = TITLE.as_ref().and_then(|sel| select_first(card, sel)) {
        record.insert("title", element_text(title));
    }

    for (i, fragment) in text_fragments(card).into_iter().enumerate() {
        if CURRENCY.is_match(&fragment) {
            record.insert("price", fragment);
        } else if DATE.is_match(&fragment) {
            record.insert("date", fragment);
        } else if EMAIL.is_match(&fragment) {
            record.insert("email", fragment);
        } else if PHONE.is_match(&fragment) {
            record.insert("phone", fragment);
        } else if i == 0 && !record.contains("title") {
            record.insert("title", fragment);
        } else {
            record.insert(format!("field_{}", i), truncate_chars(&fragment, MAX_FIELD_LEN));
        }
    }

    if let Some(src) = IMAGE
        .as_ref()
        .and_then(|sel| select_first(card, sel))
        .and_then(|img| img.value().attr("src"))
    {
        record.insert("image", src);
    }

    if let Some(href) = LINK
        .as_ref()
        .and_then(|sel| select_first(card, sel))
        .and_then(|a| a.value().attr("href"))
    {
        record.insert("link", href);
    }

    record
}
