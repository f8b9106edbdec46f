use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::types::{DataTable, FetchMeta};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// The two output directories: staged full-fidelity files for internal
/// reproducibility, public files served by the website.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub stage_dir: PathBuf,
    pub public_dir: PathBuf,
}

impl OutputPaths {
    pub fn new(stage_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            stage_dir: stage_dir.into(),
            public_dir: public_dir.into(),
        }
    }
}

/// File names for one feed's artifacts.
#[derive(Debug, Clone, Copy)]
pub struct FeedFiles {
    pub stage_csv: &'static str,
    pub public_json: &'static str,
    pub meta_json: &'static str,
}

/// Write the staged CSV, the public JSON records and the metadata file.
///
/// Called only once the table is fully built in memory, so a failed run
/// never clobbers the previously published outputs with a partial table.
pub fn publish(
    paths: &OutputPaths,
    files: &FeedFiles,
    table: &DataTable,
    meta: &FetchMeta,
) -> Result<(), OutputError> {
    fs::create_dir_all(&paths.stage_dir)?;
    fs::create_dir_all(&paths.public_dir)?;

    let csv_path = paths.stage_dir.join(files.stage_csv);
    write_csv(&csv_path, table)?;
    log::info!("Wrote {} row(s) to {}", table.row_count(), csv_path.display());

    let json_path = paths.public_dir.join(files.public_json);
    fs::write(&json_path, serde_json::to_string(&table.to_records())?)?;
    log::info!("Wrote records to {}", json_path.display());

    let meta_path = paths.public_dir.join(files.meta_json);
    fs::write(&meta_path, serde_json::to_string_pretty(meta)?)?;
    log::info!("Wrote metadata to {}", meta_path.display());

    Ok(())
}

fn write_csv(path: &Path, table: &DataTable) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(csv_cell))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render one cell for CSV: strings bare, nulls empty, anything else
/// (numbers, booleans, arrays) in its JSON form.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_cell_null_is_empty() {
        assert_eq!(csv_cell(&Value::Null), "");
    }

    #[test]
    fn test_csv_cell_strings_are_unquoted() {
        assert_eq!(csv_cell(&json!("Leeds United")), "Leeds United");
    }

    #[test]
    fn test_csv_cell_floats_keep_a_decimal_point() {
        assert_eq!(csv_cell(&json!(1_250_000.0)), "1250000.0");
    }

    #[test]
    fn test_csv_cell_integers_stay_integral() {
        assert_eq!(csv_cell(&json!(42)), "42");
    }

    #[test]
    fn test_csv_cell_arrays_are_json_encoded() {
        assert_eq!(csv_cell(&json!([1, 2])), "[1,2]");
    }
}
