use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A flat, column-ordered table ready for publication.
///
/// The schema is table-wide: every row holds exactly one cell per column,
/// with `Value::Null` standing in for missing data. Cells are JSON values so
/// text, numbers and nulls survive both the CSV and the JSON output.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// One JSON object per row, keyed by column name.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Diagnostics for one pipeline run, published alongside the data files.
/// Each run overwrites the previous metadata; nothing is kept historically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchMeta {
    pub updated_utc: String,
    pub source: String,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
}

impl FetchMeta {
    pub fn now(source: impl Into<String>, row_count: usize) -> Self {
        Self::at(Utc::now(), source, row_count)
    }

    pub fn at(when: DateTime<Utc>, source: impl Into<String>, row_count: usize) -> Self {
        Self {
            updated_utc: when.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            source: source.into(),
            row_count,
            http_status: None,
            page_title: None,
        }
    }

    pub fn with_http(mut self, status: u16, page_title: Option<String>) -> Self {
        self.http_status = Some(status);
        self.page_title = page_title;
        self
    }
}
