use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::types::DataTable;

/// Flatten nested JSON records into a flat table.
///
/// Nested objects become dot-separated columns (`stats.goals` from
/// `{"stats": {"goals": …}}`); arrays and scalars are kept verbatim. The
/// column set is the union of keys across all records, ordered by first
/// appearance, and records missing a key get a null cell — full fidelity,
/// nothing is projected away.
pub fn flatten_records(records: &[Value]) -> DataTable {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut flat_rows: Vec<Map<String, Value>> = Vec::with_capacity(records.len());

    for record in records {
        let mut flat = Map::new();
        flatten_into(&mut flat, "", record);
        for key in flat.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
        flat_rows.push(flat);
    }

    let rows = flat_rows
        .into_iter()
        .map(|mut flat| {
            columns
                .iter()
                .map(|column| flat.remove(column).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    DataTable { columns, rows }
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, &path, child);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}
