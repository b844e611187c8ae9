// src/process/page.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::{PipelineError, Result};
use crate::process::raw_table::RawPropertyTable;
use crate::process::utils::{collapse_whitespace, normalize_key};

static STATUS_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.table-incident").expect("status table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("cell selector"));
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("heading selector"));

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Parse one snapshot page into its label and property table.
///
/// Rows of every `table.table-incident` are concatenated in document order;
/// the first cell of a row names the property and the second holds its value.
/// Rows with fewer than two cells, an empty label or an empty value are skipped.
pub fn parse_page(html: &str) -> Result<RawPropertyTable> {
    let doc = Html::parse_document(html);

    let label = doc
        .select(&HEADING)
        .next()
        .map(|h| element_text(&h))
        .ok_or_else(|| PipelineError::Parse("missing top-level heading".into()))?;
    if label.is_empty() {
        return Err(PipelineError::Parse("top-level heading is empty".into()));
    }

    let mut table = RawPropertyTable::new(label);
    let mut tables_seen = 0usize;
    for status_table in doc.select(&STATUS_TABLE) {
        tables_seen += 1;
        for row in status_table.select(&ROW) {
            let mut cells = row.select(&CELL);
            let (Some(name), Some(value)) = (cells.next(), cells.next()) else {
                continue;
            };
            let key = normalize_key(&element_text(&name));
            let value = element_text(&value);
            if key.is_empty() || value.is_empty() {
                continue;
            }
            table.insert(key, value);
        }
    }

    if tables_seen == 0 {
        return Err(PipelineError::Parse("no incident status table".into()));
    }
    if table.is_empty() {
        return Err(PipelineError::Parse(
            "incident status tables contain no property rows".into(),
        ));
    }
    Ok(table)
}
