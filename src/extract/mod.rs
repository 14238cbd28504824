//! Record extraction from parsed pages
//!
//! Two modes are supported:
//! - Explicit: caller-supplied selectors describe the fields (see [`explicit`])
//! - Auto: an ordered chain of layout heuristics runs over the page; every
//!   heuristic contributes, and the general page summary is produced only
//!   when nothing else matched
//!
//! Tables, listings and articles each scan the whole page on their own.
//! Every heuristic records the elements it turned into records in a shared
//! [`Claims`] set, and the generic card heuristic skips exactly those
//! elements, so a product card is not also reported as a generic card.

mod article;
mod card;
mod explicit;
mod general;
mod listing;
mod record;
mod table;
pub(crate) mod text;

pub use article::ArticleStrategy;
pub use card::CardStrategy;
pub use explicit::extract_with_selectors;
pub use general::GeneralStrategy;
pub use listing::ListingStrategy;
pub use record::{FieldValue, Record};
pub use table::{extract_table, TableStrategy};

use scraper::{ElementRef, Html};
use thiserror::Error;

use crate::jobs::SelectorSpec;

/// Errors raised while extracting records
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?} for field {field}: {message}")]
    InvalidSelector {
        field: String,
        selector: String,
        message: String,
    },
}

/// Elements already turned into records during one auto extraction pass
#[derive(Debug, Default)]
pub struct Claims<'a> {
    elements: Vec<ElementRef<'a>>,
}

impl<'a> Claims<'a> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Marks an element as consumed
    pub fn claim(&mut self, element: ElementRef<'a>) {
        if !self.elements.contains(&element) {
            self.elements.push(element);
        }
    }

    /// Returns true if this exact element was claimed
    ///
    /// Ancestors and descendants of a claimed element are not claimed.
    pub fn is_claimed(&self, element: ElementRef<'a>) -> bool {
        self.elements.contains(&element)
    }

    /// Keeps only elements that were not claimed
    pub fn unclaimed(&self, elements: impl IntoIterator<Item = ElementRef<'a>>) -> Vec<ElementRef<'a>> {
        elements.into_iter().filter(|el| !self.is_claimed(*el)).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// One heuristic in the auto extraction chain
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Extracts records from the page, claiming every element it turns into
    /// a record
    ///
    /// Whether earlier claims are honored is up to the heuristic.
    fn extract<'a>(&self, document: &'a Html, claims: &mut Claims<'a>) -> Vec<Record>;
}

/// Runs explicit or auto extraction over a parsed page
pub struct ExtractionEngine {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: Box<dyn ExtractionStrategy>,
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionEngine {
    /// Creates an engine with the standard heuristic chain:
    /// tables, listings, articles, cards, then the general fallback
    pub fn new() -> Self {
        Self::with_strategies(
            vec![
                Box::new(TableStrategy),
                Box::new(ListingStrategy),
                Box::new(ArticleStrategy),
                Box::new(CardStrategy),
            ],
            Box::new(GeneralStrategy),
        )
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        fallback: Box<dyn ExtractionStrategy>,
    ) -> Self {
        Self {
            strategies,
            fallback,
        }
    }

    /// Appends a heuristic to the end of the chain, before the fallback
    pub fn push_strategy(&mut self, strategy: Box<dyn ExtractionStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parses `html` and extracts records from it
    pub fn extract(
        &self,
        html: &str,
        selectors: Option<&SelectorSpec>,
    ) -> Result<Vec<Record>, ExtractError> {
        let document = Html::parse_document(html);
        self.extract_document(&document, selectors)
    }

    /// Extracts records from an already parsed page
    ///
    /// Non-empty `selectors` select explicit mode; otherwise the heuristic
    /// chain runs.
    pub fn extract_document(
        &self,
        document: &Html,
        selectors: Option<&SelectorSpec>,
    ) -> Result<Vec<Record>, ExtractError> {
        match selectors {
            Some(spec) if !spec.is_empty() => extract_with_selectors(document, spec),
            _ => Ok(self.auto_extract(document)),
        }
    }

    /// Runs every heuristic in order and falls back to the page summary when
    /// none produced a record
    pub fn auto_extract(&self, document: &Html) -> Vec<Record> {
        let mut claims = Claims::new();
        let mut records = Vec::new();

        for strategy in &self.strategies {
            let found = strategy.extract(document, &mut claims);
            tracing::debug!("{} heuristic produced {} records", strategy.name(), found.len());
            records.extend(found);
        }

        if records.is_empty() {
            records = self.fallback.extract(document, &mut claims);
            tracing::debug!(
                "{} fallback produced {} records",
                self.fallback.name(),
                records.len()
            );
        }

        records
    }
}
