//! Article and blog post extraction

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::text::{
    compile, element_text, first_pattern_match, has_class_matching, raw_text, select_first,
    selector, truncate_chars,
};
use super::{Claims, ExtractionStrategy, Record};

const MAX_ARTICLES: usize = 50;
const MAX_AUTHOR_LEN: usize = 100;
const MAX_SUMMARY_LEN: usize = 300;
const MAX_CATEGORIES: usize = 5;

static CONTAINER_PATTERNS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "article",
        "div.post",
        "div.article",
        "div.blog-post",
        "div.entry",
        "section.post",
        "div.content-item",
    ])
});

static HEADING: Lazy<Option<Selector>> = Lazy::new(|| selector("h1, h2, h3, h4"));
static BLOCK: Lazy<Option<Selector>> = Lazy::new(|| selector("span, div, p"));
static SUMMARY_BLOCK: Lazy<Option<Selector>> = Lazy::new(|| selector("p, div"));
static PARAGRAPH: Lazy<Option<Selector>> = Lazy::new(|| selector("p"));
static LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a[href]"));
static LABEL: Lazy<Option<Selector>> = Lazy::new(|| selector("span, a"));

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d{4}-\d{2}-\d{2}",
        r"\d{1,2}/\d{1,2}/\d{4}",
        r"[A-Za-z]+ \d{1,2}, \d{4}",
        r"\d{1,2} [A-Za-z]+ \d{4}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date pattern"))
    .collect()
});

static AUTHOR_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)author|by-line|writer").expect("author pattern"));
static SUMMARY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)summary|excerpt|description").expect("summary pattern"));
static CATEGORY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)category|tag|label").expect("category pattern"));

/// Detects article-like blocks such as blog posts and news items
pub struct ArticleStrategy;

impl ExtractionStrategy for ArticleStrategy {
    fn name(&self) -> &'static str {
        "article"
    }

    fn extract<'a>(&self, document: &'a Html, claims: &mut Claims<'a>) -> Vec<Record> {
        let articles = CONTAINER_PATTERNS
            .iter()
            .map(|pattern| document.select(pattern).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default();

        let mut records = Vec::new();
        for article in articles.into_iter().take(MAX_ARTICLES) {
            let record = extract_article(article);
            if record.contains("title") {
                claims.claim(article);
                records.push(record);
            }
        }
        records
    }
}

fn matching_blocks<'a>(
    scope: ElementRef<'a>,
    sel: &Lazy<Option<Selector>>,
    class_pattern: &Regex,
) -> Vec<ElementRef<'a>> {
    match sel.as_ref() {
        Some(s) => scope
            .select(s)
            .filter(|el| has_class_matching(*el, class_pattern))
            .collect(),
        None => Vec::new(),
    }
}

fn extract_article(article: ElementRef<'_>) -> Record {
    let mut record = Record::new();

    if let Some(heading) = HEADING.as_ref().and_then(|sel| select_first(article, sel)) {
        record.insert("title", element_text(heading));
    }

    if let Some(date) = first_pattern_match(&raw_text(article), &DATE_PATTERNS) {
        record.insert("date", date);
    }

    let author = matching_blocks(article, &BLOCK, &AUTHOR_CLASS)
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty() && text.chars().count() < MAX_AUTHOR_LEN)
        .map(|text| strip_byline(&text));
    if let Some(author) = author {
        record.insert("author", author);
    }

    let summary = matching_blocks(article, &SUMMARY_BLOCK, &SUMMARY_CLASS)
        .into_iter()
        .next()
        .or_else(|| PARAGRAPH.as_ref().and_then(|sel| select_first(article, sel)));
    if let Some(summary) = summary {
        record.insert("summary", truncate_chars(&element_text(summary), MAX_SUMMARY_LEN));
    }

    if let Some(href) = LINK
        .as_ref()
        .and_then(|sel| select_first(article, sel))
        .and_then(|a| a.value().attr("href"))
    {
        record.insert("link", href);
    }

    let categories: Vec<String> = matching_blocks(article, &LABEL, &CATEGORY_CLASS)
        .into_iter()
        .take(MAX_CATEGORIES)
        .map(element_text)
        .collect();
    if !categories.is_empty() {
        record.insert("categories", categories);
    }

    record
}

fn strip_byline(text: &str) -> String {
    text.strip_prefix("By ")
        .or_else(|| text.strip_prefix("by "))
        .unwrap_or(text)
        .trim()
        .to_string()
}
