//! Product and listing extraction
//!
//! Pages laid out like the books.toscrape catalogue get a dedicated preset.
//! Everything else goes through generic container discovery followed by
//! per-candidate field detection.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::text::{
    compile, element_text, first_attr, first_pattern_match, raw_text, select_first, selector,
    truncate_chars,
};
use super::{Claims, ExtractionStrategy, Record};

const MAX_CANDIDATES: usize = 100;
const MAX_LIST_ITEMS: usize = 50;
const MIN_LIST_ITEM_TEXT: usize = 30;
const MIN_TITLE_LEN: usize = 3;
const MIN_DESCRIPTION_LEN: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 200;

static CONTAINER_PATTERNS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "article.product_pod",
        "div.product",
        "article.product",
        "li.product",
        "div.product-item",
        "div.product-card",
        "div.item",
        "article.item",
        "li.item",
        "div.col-product",
        "div.grid-item",
        "article[data-product]",
        "div[data-product-id]",
        r#"li[class*="product"]"#,
        r#"div[class*="product"]"#,
        r#"article[class*="product"]"#,
        "div.card.product",
    ])
});

static TITLE_TAGS: Lazy<Vec<Selector>> = Lazy::new(|| compile(&["h1", "h2", "h3", "h4", "h5"]));
static PRICE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[".price", ".price_color", ".cost", r#"[class*="price"]"#, "[data-price]"])
});
static DESCRIPTION_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| compile(&[".description", ".summary", ".excerpt", "p"]));
static STOCK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[".availability", ".stock", ".instock", r#"[class*="stock"]"#])
});

static ARTICLE: Lazy<Option<Selector>> = Lazy::new(|| selector("article"));
static CLASSED_ITEM: Lazy<Option<Selector>> = Lazy::new(|| selector("li[class]"));
static TITLED_LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a[title]"));
static ANY_LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a"));
static HREF_LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a[href]"));
static IMAGE: Lazy<Option<Selector>> = Lazy::new(|| selector("img"));
static RATING: Lazy<Option<Selector>> =
    Lazy::new(|| selector(r#"[class*="rating"], [class*="star"]"#));

static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[\$£€]\s*[\d,]+\.?\d*",
        r"USD\s*[\d,]+\.?\d*",
        r"Rs\.?\s*[\d,]+\.?\d*",
        r"Price:\s*([\d,]+\.?\d*)",
        r"\b\d+\.\d{2}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("price pattern"))
    .collect()
});

// Most specific first: "out of stock" also contains "in stock" style words.
const AVAILABILITY_KEYWORDS: &[(&str, &str)] = &[
    ("out of stock", "Out of Stock"),
    ("unavailable", "Out of Stock"),
    ("in stock", "In Stock"),
    ("available", "In Stock"),
];

const RATING_WORDS: &[(&str, &str, &str)] = &[
    ("five", "5", "5 stars"),
    ("four", "4", "4 stars"),
    ("three", "3", "3 stars"),
    ("two", "2", "2 stars"),
    ("one", "1", "1 star"),
];

/// Detects repeated product or listing blocks
pub struct ListingStrategy;

impl ExtractionStrategy for ListingStrategy {
    fn name(&self) -> &'static str {
        "listing"
    }

    fn extract<'a>(&self, document: &'a Html, claims: &mut Claims<'a>) -> Vec<Record> {
        let preset = bookstore::extract(document, claims);
        if !preset.is_empty() {
            return preset;
        }

        let candidates = find_candidates(document);
        tracing::debug!("listing heuristic found {} candidates", candidates.len());

        let mut records = Vec::new();
        for candidate in candidates.into_iter().take(MAX_CANDIDATES) {
            let record = extract_item(candidate);
            if record.contains("title") || record.contains("price") {
                claims.claim(candidate);
                records.push(record);
            }
        }
        records
    }
}

/// Finds repeated listing containers
///
/// Takes the first container pattern with more than one match, then
/// `article` elements when there are more than two, then classed list items
/// with enough text.
fn find_candidates(document: &Html) -> Vec<ElementRef<'_>> {
    for pattern in CONTAINER_PATTERNS.iter() {
        let found: Vec<ElementRef<'_>> = document.select(pattern).collect();
        if found.len() > 1 {
            return found;
        }
    }

    if let Some(article) = ARTICLE.as_ref() {
        let articles: Vec<ElementRef<'_>> = document.select(article).collect();
        if articles.len() > 2 {
            return articles;
        }
    }

    match CLASSED_ITEM.as_ref() {
        Some(item) => document
            .select(item)
            .filter(|li| element_text(*li).chars().count() > MIN_LIST_ITEM_TEXT)
            .take(MAX_LIST_ITEMS)
            .collect(),
        None => Vec::new(),
    }
}

/// Extracts the listing fields of one candidate element
fn extract_item(item: ElementRef<'_>) -> Record {
    let mut record = Record::new();

    if let Some(title) = item_title(item) {
        record.insert("title", title);
    }

    if let Some(price) = item_price(item) {
        record.insert("price", price);
    }

    let description = DESCRIPTION_SELECTORS.iter().find_map(|sel| {
        select_first(item, sel)
            .map(element_text)
            .filter(|text| text.chars().count() > MIN_DESCRIPTION_LEN)
    });
    if let Some(description) = description {
        record.insert("description", truncate_chars(&description, MAX_DESCRIPTION_LEN));
    }

    let image = IMAGE
        .as_ref()
        .and_then(|sel| select_first(item, sel))
        .and_then(|img| first_attr(img, &["src", "data-src", "data-lazy-src"]));
    if let Some(image) = image {
        record.insert("image", image);
    }

    let link = HREF_LINK
        .as_ref()
        .and_then(|sel| select_first(item, sel))
        .and_then(|a| a.value().attr("href"));
    if let Some(link) = link {
        record.insert("link", link);
    }

    if let Some(rating) = RATING.as_ref().and_then(|sel| select_first(item, sel)) {
        if let Some(value) = rating_value(rating) {
            record.insert("rating", value);
        }
    }

    if let Some(availability) = item_availability(item) {
        record.insert("availability", availability);
    }

    record
}

fn item_title(item: ElementRef<'_>) -> Option<String> {
    let heading = TITLE_TAGS
        .iter()
        .find_map(|sel| select_first(item, sel))
        .map(element_text);

    let title = heading
        .or_else(|| {
            TITLED_LINK
                .as_ref()
                .and_then(|sel| select_first(item, sel))
                .and_then(|a| a.value().attr("title"))
                .map(|t| t.trim().to_string())
        })
        .or_else(|| {
            ANY_LINK
                .as_ref()
                .and_then(|sel| select_first(item, sel))
                .map(element_text)
        })?;

    (title.chars().count() > MIN_TITLE_LEN).then_some(title)
}

fn item_price(item: ElementRef<'_>) -> Option<String> {
    PRICE_SELECTORS
        .iter()
        .find_map(|sel| select_first(item, sel).map(element_text).filter(|t| !t.is_empty()))
        .or_else(|| first_pattern_match(&element_text(item), &PRICE_PATTERNS))
}

/// Reads a rating from class names, falling back to the element's text
///
/// Classes are inspected in attribute order and the last one naming a
/// rating wins.
fn rating_value(rating: ElementRef<'_>) -> Option<String> {
    let mut value = None;
    for class in rating.value().attr("class").unwrap_or("").split_whitespace() {
        let class = class.to_lowercase();
        if let Some((_, _, label)) = RATING_WORDS
            .iter()
            .find(|(word, digit, _)| class.contains(word) || class.contains(digit))
        {
            value = Some(label.to_string());
        }
    }

    value.or_else(|| Some(element_text(rating)).filter(|t| !t.is_empty()))
}

fn item_availability(item: ElementRef<'_>) -> Option<String> {
    let from_selector = STOCK_SELECTORS
        .iter()
        .find_map(|sel| select_first(item, sel).map(element_text).filter(|t| !t.is_empty()));
    if from_selector.is_some() {
        return from_selector;
    }

    let text = raw_text(item).to_lowercase();
    AVAILABILITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, label)| label.to_string())
}

/// Preset for the books.toscrape catalogue layout
mod bookstore {
    use super::*;

    static POD: Lazy<Option<Selector>> = Lazy::new(|| selector("article.product_pod"));
    static TITLE_LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("h3 a"));
    static PRICE: Lazy<Option<Selector>> = Lazy::new(|| selector("p.price_color"));
    static STAR_RATING: Lazy<Option<Selector>> = Lazy::new(|| selector("p.star-rating"));
    static AVAILABILITY: Lazy<Option<Selector>> =
        Lazy::new(|| selector("p.instock.availability"));
    static COVER: Lazy<Option<Selector>> = Lazy::new(|| selector("div.image_container img"));

    const RATING_CLASSES: &[&str] = &["One", "Two", "Three", "Four", "Five"];

    pub(super) fn extract<'a>(document: &'a Html, claims: &mut Claims<'a>) -> Vec<Record> {
        let Some(pod) = POD.as_ref() else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for book in document.select(pod) {
            let record = extract_book(book);
            if !record.is_empty() {
                claims.claim(book);
                records.push(record);
            }
        }
        records
    }

    fn first<'a>(scope: ElementRef<'a>, sel: &Lazy<Option<Selector>>) -> Option<ElementRef<'a>> {
        sel.as_ref().and_then(|s| select_first(scope, s))
    }

    fn extract_book(book: ElementRef<'_>) -> Record {
        let mut record = Record::new();
        let title_link = first(book, &TITLE_LINK);

        if let Some(link) = title_link {
            let title = link
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| element_text(link));
            record.insert("title", title);
        }

        if let Some(price) = first(book, &PRICE) {
            record.insert("price", element_text(price));
        }

        if let Some(rating) = first(book, &STAR_RATING) {
            if let Some(word) = rating
                .value()
                .attr("class")
                .unwrap_or("")
                .split_whitespace()
                .find(|class| RATING_CLASSES.contains(class))
            {
                record.insert("rating", word);
            }
        }

        if let Some(stock) = first(book, &AVAILABILITY) {
            record.insert("availability", element_text(stock));
        }

        if let Some(src) = first(book, &COVER).and_then(|img| img.value().attr("src")) {
            record.insert("image", src);
        }

        if let Some(href) = title_link.and_then(|a| a.value().attr("href")) {
            record.insert("link", href);
        }

        record
    }
}
