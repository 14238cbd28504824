//! Table extraction
//!
//! Headers come from `thead` cells when the table has a header section, or
//! from the first row otherwise. A row becomes a record only when its cell
//! count equals the header count and at least one cell has text.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::text::{element_text, select_first, selector};
use super::{Claims, ExtractionStrategy, Record};

static TABLE: Lazy<Option<Selector>> = Lazy::new(|| selector("table"));
static THEAD: Lazy<Option<Selector>> = Lazy::new(|| selector("thead"));
static TBODY: Lazy<Option<Selector>> = Lazy::new(|| selector("tbody"));
static ROW: Lazy<Option<Selector>> = Lazy::new(|| selector("tr"));
static CELL: Lazy<Option<Selector>> = Lazy::new(|| selector("th, td"));

/// Turns every `table` on the page into records
pub struct TableStrategy;

impl ExtractionStrategy for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn extract<'a>(&self, document: &'a Html, claims: &mut Claims<'a>) -> Vec<Record> {
        let Some(table_selector) = TABLE.as_ref() else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for table in document.select(table_selector) {
            let rows = extract_table(table);
            if !rows.is_empty() {
                claims.claim(table);
                records.extend(rows);
            }
        }
        records
    }
}

/// Extracts the data rows of one table
///
/// The row the headers were taken from is never reported as data.
pub fn extract_table(table: ElementRef<'_>) -> Vec<Record> {
    let (Some(thead_sel), Some(tbody_sel), Some(row_sel), Some(cell_sel)) =
        (THEAD.as_ref(), TBODY.as_ref(), ROW.as_ref(), CELL.as_ref())
    else {
        return Vec::new();
    };

    let thead = select_first(table, thead_sel);
    let (headers, header_row) = match thead {
        Some(head) => (cell_texts(head, cell_sel), None),
        None => match select_first(table, row_sel) {
            Some(first_row) => (cell_texts(first_row, cell_sel), Some(first_row)),
            None => (Vec::new(), None),
        },
    };

    if headers.is_empty() {
        return Vec::new();
    }

    let body = select_first(table, tbody_sel).unwrap_or(table);

    body.select(row_sel)
        .filter(|row| Some(*row) != header_row)
        .filter(|row| thead.map_or(true, |head| !row.ancestors().any(|a| a == *head)))
        .filter_map(|row| {
            let cells = cell_texts(row, cell_sel);
            if cells.len() != headers.len() || cells.iter().all(String::is_empty) {
                return None;
            }
            Some(headers.iter().cloned().zip(cells).collect::<Record>())
        })
        .collect()
}

fn cell_texts(scope: ElementRef<'_>, cell_sel: &Selector) -> Vec<String> {
    scope.select(cell_sel).map(element_text).collect()
}
