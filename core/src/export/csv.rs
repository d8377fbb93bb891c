//! Records to CSV.
//!
//! The header row comes from the keys of the first record, in the order
//! the server sent them. Cells follow fixed rules: `null` or a missing key
//! is empty, arrays and objects are compact JSON, strings are verbatim,
//! other scalars use their JSON text. A cell containing a comma, a double
//! quote, or a line break is wrapped in double quotes with inner quotes
//! doubled; every other cell is written bare.

use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::ExportError;

/// Render `records` as CSV text. Rows are separated by `\n` with no
/// trailing newline; an empty slice yields an empty string.
pub fn convert_to_csv(records: &[Value]) -> Result<String, ExportError> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = as_object(first, 0)?.keys().map(String::as_str).collect();

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for (index, record) in records.iter().enumerate() {
        let object = as_object(record, index)?;
        let row: Vec<String> = header
            .iter()
            .map(|key| cell(object.get(*key)))
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Write `records` to `<dir>/<filename>`.
///
/// Returns the written path, or `None` when there was nothing to export.
pub fn download_csv(
    records: &[Value],
    dir: &Path,
    filename: &str,
) -> Result<Option<PathBuf>, ExportError> {
    if records.is_empty() {
        warn!(filename, "no data to export");
        return Ok(None);
    }
    validate_filename(filename)?;

    let text = convert_to_csv(records)?;
    let path = dir.join(filename);
    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&path, text.as_bytes()))
        .map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), rows = records.len(), "exported csv");
    Ok(Some(path))
}

/// Exporter bound to one output directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.export_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn download_csv(
        &self,
        records: &[Value],
        filename: &str,
    ) -> Result<Option<PathBuf>, ExportError> {
        download_csv(records, &self.dir, filename)
    }
}

fn as_object(record: &Value, index: usize) -> Result<&Map<String, Value>, ExportError> {
    record
        .as_object()
        .ok_or(ExportError::NotAnObject { index })
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn validate_filename(filename: &str) -> Result<(), ExportError> {
    let trimmed = filename.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
    {
        return Err(ExportError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_then_rows_and_comma_cells_stay_one_column() {
        let records = vec![json!({"a": 1, "b": "x"}), json!({"a": 2, "b": "y,z"})];
        let text = convert_to_csv(&records).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["a,b", "1,x", "2,\"y,z\""]);

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert!(rows.iter().all(|row| row.len() == 2));
        assert_eq!(&rows[1][1], "y,z");
    }

    #[test]
    fn quotes_are_doubled_inside_quoted_cells() {
        let text = convert_to_csv(&[json!({"note": "say \"hi\""})]).unwrap();
        assert_eq!(text, "note\n\"say \"\"hi\"\"\"");
    }

    #[test]
    fn nulls_missing_keys_and_nested_values() {
        let records = vec![
            json!({"id": 1, "tags": ["a", "b"], "owner": null}),
            json!({"id": 2, "owner": {"name": "R"}}),
        ];
        let text = convert_to_csv(&records).unwrap();
        assert_eq!(
            text,
            "id,tags,owner\n1,\"[\"\"a\"\",\"\"b\"\"]\",\n2,,\"{\"\"name\"\":\"\"R\"\"}\""
        );
    }

    #[test]
    fn booleans_and_floats_use_json_text() {
        let text = convert_to_csv(&[json!({"ok": true, "ratio": 0.5})]).unwrap();
        assert_eq!(text, "ok,ratio\ntrue,0.5");
    }

    #[test]
    fn header_follows_first_record_key_order() {
        let records = vec![
            json!({"zeta": 1, "alpha": 2}),
            json!({"alpha": 3, "zeta": 4, "extra": 5}),
        ];
        let text = convert_to_csv(&records).unwrap();
        assert_eq!(text, "zeta,alpha\n1,2\n4,3");
    }

    #[test]
    fn empty_input_is_empty_string() {
        assert_eq!(convert_to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = convert_to_csv(&[json!({"a": 1}), json!([1, 2])]).unwrap_err();
        assert!(matches!(err, ExportError::NotAnObject { index: 1 }));
    }

    #[test]
    fn download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path().join("exports"));
        let path = exporter
            .download_csv(&[json!({"a": 1})], "orders.csv")
            .unwrap()
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a\n1");
    }

    #[test]
    fn empty_download_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let result = download_csv(&[], dir.path(), "f.csv").unwrap();
        assert_eq!(result, None);
        assert!(!dir.path().join("f.csv").exists());
    }

    #[test]
    fn download_rejects_path_like_filenames() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../escape.csv", "a/b.csv", "", ".."] {
            let err = download_csv(&[json!({"a": 1})], dir.path(), name).unwrap_err();
            assert!(matches!(err, ExportError::InvalidFilename(_)), "{name}");
        }
    }
}
