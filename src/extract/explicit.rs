//! Extraction driven by caller-supplied selectors
//!
//! With a `container` selector, every container element yields one record
//! built from the other field selectors evaluated inside it. Without one,
//! fields are evaluated against the whole page: when the first field matches
//! several elements the fields are zipped by index, otherwise a single record
//! holds every field's text (or list of texts when a selector matches more
//! than once).

use scraper::{ElementRef, Html, Selector};

use super::text::element_text;
use super::{ExtractError, Record};
use crate::jobs::{SelectorSpec, CONTAINER_KEY};

/// Extracts records from `document` using the given selectors
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `spec` - Field name to selector mapping, optionally with a container
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Records with at least one matched field each
/// * `Err(ExtractError)` - A selector failed to parse
pub fn extract_with_selectors(
    document: &Html,
    spec: &SelectorSpec,
) -> Result<Vec<Record>, ExtractError> {
    let fields = compile_fields(spec)?;

    match spec.container() {
        Some(container) => {
            let container = compile(CONTAINER_KEY, container)?;
            Ok(extract_containers(document, &container, &fields))
        }
        None => Ok(extract_flat(document, &fields)),
    }
}

fn compile(field: &str, css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
        field: field.to_string(),
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn compile_fields(spec: &SelectorSpec) -> Result<Vec<(String, Selector)>, ExtractError> {
    spec.fields()
        .map(|(name, css)| Ok((name.to_string(), compile(name, css)?)))
        .collect()
}

fn extract_containers(
    document: &Html,
    container: &Selector,
    fields: &[(String, Selector)],
) -> Vec<Record> {
    document
        .select(container)
        .map(|item| {
            fields
                .iter()
                .filter_map(|(name, sel)| {
                    item.select(sel)
                        .next()
                        .map(|el| (name.clone(), element_text(el)))
                })
                .collect::<Record>()
        })
        .filter(|record| !record.is_empty())
        .collect()
}

fn extract_flat(document: &Html, fields: &[(String, Selector)]) -> Vec<Record> {
    if fields.is_empty() {
        return Vec::new();
    }

    let matches: Vec<Vec<ElementRef<'_>>> = fields
        .iter()
        .map(|(_, sel)| document.select(sel).collect())
        .collect();

    let first_count = matches[0].len();
    if first_count > 1 {
        return (0..first_count)
            .map(|i| {
                fields
                    .iter()
                    .zip(&matches)
                    .filter_map(|((name, _), found)| {
                        found.get(i).map(|el| (name.clone(), element_text(*el)))
                    })
                    .collect::<Record>()
            })
            .filter(|record| !record.is_empty())
            .collect();
    }

    let mut record = Record::new();
    for ((name, _), found) in fields.iter().zip(&matches) {
        match found.as_slice() {
            [] => {}
            [only] => record.insert(name.clone(), element_text(*only)),
            many => record.insert(
                name.clone(),
                many.iter().map(|el| element_text(*el)).collect::<Vec<_>>(),
            ),
        }
    }

    if record.is_empty() {
        Vec::new()
    } else {
        vec![record]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldValue;

    fn spec(pairs: &[(&str, &str)]) -> SelectorSpec {
        pairs
            .iter()
            .fold(SelectorSpec::new(), |spec, (k, v)| spec.with_field(*k, *v))
    }

    const QUOTES: &str = r#"
        <html><body>
          <div class="quote"><span class="text">Be kind.</span><small class="author">Ann</small></div>
          <div class="quote"><span class="text">Be brave.</span><small class="author">Ben</small></div>
          <div class="quote"><span class="text">Be curious.</span></div>
        </body></html>
    "#;

    #[test]
    fn test_one_record_per_container() {
        let document = Html::parse_document(QUOTES);
        let records = extract_with_selectors(
            &document,
            &spec(&[("container", "div.quote"), ("quote", ".text"), ("by", ".author")]),
        )
        .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].text("quote"), Some("Be kind."));
        assert_eq!(records[1].text("by"), Some("Ben"));
        assert!(!records[2].contains("by"));
    }

    #[test]
    fn test_container_records_without_fields_omitted() {
        let document = Html::parse_document(QUOTES);
        let records = extract_with_selectors(
            &document,
            &spec(&[("container", "div.quote"), ("by", ".author")]),
        )
        .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_matched_empty_field_keeps_container_record() {
        let document = Html::parse_document(
            r#"<div class="item"><h3></h3></div>
               <div class="item"><h3>Second</h3></div>
               <div class="item"><h3>Third</h3></div>"#,
        );
        let records =
            extract_with_selectors(&document, &spec(&[("container", ".item"), ("title", "h3")]))
                .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].text("title"), Some(""));
        assert_eq!(records[2].text("title"), Some("Third"));
    }

    #[test]
    fn test_zip_by_index() {
        let document = Html::parse_document(QUOTES);
        let records =
            extract_with_selectors(&document, &spec(&[("quote", ".text"), ("by", ".author")]))
                .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].text("by"), Some("Ann"));
        assert_eq!(records[2].text("quote"), Some("Be curious."));
        assert!(!records[2].contains("by"));
    }

    #[test]
    fn test_single_record_with_lists() {
        let document = Html::parse_document(
            r#"<h1>Menu</h1><li class="dish">Soup</li><li class="dish">Salad</li>"#,
        );
        let records = extract_with_selectors(
            &document,
            &spec(&[("heading", "h1"), ("dishes", "li.dish"), ("missing", ".none")]),
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("heading"), Some("Menu"));
        assert_eq!(
            records[0].get("dishes"),
            Some(&FieldValue::List(vec!["Soup".into(), "Salad".into()]))
        );
        assert!(!records[0].contains("missing"));
    }

    #[test]
    fn test_nothing_matched_yields_no_records() {
        let document = Html::parse_document("<p>plain</p>");
        let records = extract_with_selectors(&document, &spec(&[("title", "h1")])).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let document = Html::parse_document("<p>plain</p>");
        let err = extract_with_selectors(&document, &spec(&[("title", "h1[")])).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSelector { ref field, .. } if field == "title"));
    }
}
