use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};

/// One table lifted out of an HTML document, prior to any role mapping.
///
/// Headers are whitespace-normalized. Duplicate labels get `.1`, `.2`, …
/// suffixes in reading order, matching the convention the upstream source
/// drifts in and out of. A table with no header row gets positional labels
/// (`"0"`, `"1"`, …) so downstream structural fallbacks still apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// rows × columns, the size metric used by table selection.
    pub fn size(&self) -> usize {
        self.rows.len() * self.headers.len()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }

    /// Cells of one column, in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<&str>> {
        self.rows
            .iter()
            .map(move |row| row.get(index).and_then(|cell| cell.as_deref()))
    }
}

pub(crate) fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse every `<table>` element in `html`, in document order.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap();

    document.select(&table_sel).filter_map(parse_table).collect()
}

fn parse_table(table: ElementRef) -> Option<RawTable> {
    let tr_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for tr in table.select(&tr_sel) {
        let cells: Vec<ElementRef> = tr.select(&cell_sel).collect();
        if cells.is_empty() {
            continue;
        }

        // The first row made up entirely of <th> cells is the header; any
        // later heading rows are kept as data so no club row is ever lost.
        if header.is_none() && cells.iter().all(|c| c.value().name() == "th") {
            header = Some(dedupe_labels(
                cells
                    .iter()
                    .map(|c| normalize_whitespace(&elem_text(*c)))
                    .collect(),
            ));
            continue;
        }

        rows.push(
            cells
                .iter()
                .map(|c| {
                    let text = normalize_whitespace(&elem_text(*c));
                    (!text.is_empty()).then_some(text)
                })
                .collect(),
        );
    }

    if header.is_none() && rows.is_empty() {
        return None;
    }

    let width = rows
        .iter()
        .map(Vec::len)
        .chain(header.as_ref().map(Vec::len))
        .max()
        .unwrap_or(0);

    let mut headers = header.unwrap_or_default();
    while headers.len() < width {
        headers.push(headers.len().to_string());
    }
    for row in &mut rows {
        row.resize(width, None);
    }

    Some(RawTable { headers, rows })
}

/// pandas-style mangling: the second "Club" becomes "Club.1", and so on.
fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    labels
        .into_iter()
        .map(|label| {
            let count = seen.entry(label.clone()).or_insert(0);
            let out = if *count == 0 {
                label.clone()
            } else {
                format!("{}.{}", label, count)
            };
            *count += 1;
            out
        })
        .collect()
}
