//! Table snapshots on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Persists one table under a name and snapshot index.
pub trait TableSink {
    fn write_table<T: Serialize>(&self, name: &str, index: usize, rows: &[T]) -> Result<PathBuf>;
}

/// On-disk encoding for table snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableFormat {
    /// One JSON object per line (`.jsonl`).
    #[default]
    JsonLines,
    /// A single JSON array (`.json`).
    Json,
}

impl TableFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::JsonLines => "jsonl",
            Self::Json => "json",
        }
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jsonl" | "jsonlines" | "ndjson" => Ok(Self::JsonLines),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!(
                "unknown table format '{other}' (expected jsonl or json)"
            ))),
        }
    }
}

/// Writes tables as JSON files into a directory.
#[derive(Debug, Clone)]
pub struct JsonTableSink {
    dir: PathBuf,
    format: TableFormat,
}

impl JsonTableSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, format: TableFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot for `name` at `index`.
    #[must_use]
    pub fn table_path(&self, name: &str, index: usize) -> PathBuf {
        self.dir
            .join(format!("{name}_{index:06}.{}", self.format.extension()))
    }
}

impl TableSink for JsonTableSink {
    fn write_table<T: Serialize>(&self, name: &str, index: usize, rows: &[T]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.table_path(name, index);
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut writer = BufWriter::new(file);

        match self.format {
            TableFormat::JsonLines => {
                for row in rows {
                    serde_json::to_writer(&mut writer, row)?;
                    writer.write_all(b"\n").map_err(|e| Error::io(&path, e))?;
                }
            }
            TableFormat::Json => serde_json::to_writer(&mut writer, rows)?,
        }
        writer.flush().map_err(|e| Error::io(&path, e))?;

        tracing::debug!(path = %path.display(), rows = rows.len(), "Wrote table snapshot");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_format_parsing() {
        assert_eq!("jsonl".parse::<TableFormat>().unwrap(), TableFormat::JsonLines);
        assert_eq!("JSON".parse::<TableFormat>().unwrap(), TableFormat::Json);
        assert!("parquet".parse::<TableFormat>().is_err());
    }

    #[test]
    fn test_json_lines_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonTableSink::new(dir.path(), TableFormat::JsonLines);
        let rows = vec![json!({ "id": "1" }), json!({ "id": "2" })];

        let path = sink.write_table("users", 1000, &rows).unwrap();
        assert!(path.ends_with("users_001000.jsonl"));

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_json_array_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonTableSink::new(dir.path().join("out"), TableFormat::Json);

        let path = sink.write_table::<Value>("media", 7, &[]).unwrap();
        assert!(path.ends_with("media_000007.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
