// src/catalog/source.rs
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{RawRow, RawVideoRecord};
use crate::error::{CatalogError, MalformedReason};

/// Anything that can hand the engine a batch of raw catalog rows.
/// Whether they come from a file, a database dump or a fixture is not the engine's business.
/// A row that cannot be shaped into a record is returned as `Err` in place; only a batch
/// that cannot be read at all fails the fetch.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<RawRow>, CatalogError>;
    fn name(&self) -> &str;
}

/// Reads a JSON array (`*.json`) or JSON lines (`*.jsonl` / `*.ndjson`) file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json_lines(&self) -> bool {
        matches!(
            self.path
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_ascii_lowercase())
                .as_deref(),
            Some("jsonl") | Some("ndjson")
        )
    }
}

#[async_trait::async_trait]
impl CatalogSource for JsonFileSource {
    async fn fetch_records(&self) -> Result<Vec<RawRow>, CatalogError> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| CatalogError::Read {
                    path: self.path.display().to_string(),
                    source,
                })?;

        if self.is_json_lines() {
            return Ok(content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| serde_json::from_str::<RawVideoRecord>(l).map_err(shape_error))
                .collect());
        }

        // Only the outer array is all-or-nothing; each element is shaped on its own.
        let rows: Vec<Value> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(rows
            .into_iter()
            .map(|v| serde_json::from_value::<RawVideoRecord>(v).map_err(shape_error))
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn shape_error(e: serde_json::Error) -> MalformedReason {
    MalformedReason::InvalidShape {
        detail: e.to_string(),
    }
}

/// In-memory rows; handy for tests and for callers that already hold a batch.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rows: Vec<RawVideoRecord>,
}

impl StaticSource {
    pub fn new(rows: Vec<RawVideoRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait::async_trait]
impl CatalogSource for StaticSource {
    async fn fetch_records(&self) -> Result<Vec<RawRow>, CatalogError> {
        Ok(self.rows.iter().cloned().map(Ok).collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn reads_json_array_and_lines() {
        let dir = tempfile::tempdir().unwrap();

        let arr = dir.path().join("catalog.json");
        fs::write(
            &arr,
            r#"[{"video_id": 1, "title": "a", "views": "10"}, {"id": 2, "likes": 3}]"#,
        )
        .unwrap();
        let rows = JsonFileSource::new(&arr).fetch_records().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(Result::is_ok));

        let lines = dir.path().join("catalog.jsonl");
        fs::write(&lines, "{\"id\": 1}\n\n{\"id\": 2, \"publishedAt\": \"2024-01-01\"}\n").unwrap();
        let rows = JsonFileSource::new(&lines).fetch_records().await.unwrap();
        assert_eq!(rows.len(), 2);
        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.published_at.as_deref(), Some("2024-01-01"));
    }

    #[tokio::test]
    async fn mistyped_rows_are_isolated_not_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let arr = dir.path().join("catalog.json");
        fs::write(
            &arr,
            r#"[{"id": 1, "title": "ok", "views": 10}, {"id": 2, "views": true}, {"id": 3, "title": 2024}, "just text"]"#,
        )
        .unwrap();
        let rows = JsonFileSource::new(&arr).fetch_records().await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_ok());
        for bad in &rows[1..] {
            assert!(matches!(bad, Err(MalformedReason::InvalidShape { .. })));
        }

        let lines = dir.path().join("catalog.ndjson");
        fs::write(&lines, "{\"id\": 1}\nnot json\n{\"id\": 2}\n").unwrap();
        let rows = JsonFileSource::new(&lines).fetch_records().await.unwrap();
        assert_eq!(rows.iter().filter(|r| r.is_ok()).count(), 2);
        assert!(rows[1].is_err());
    }

    #[tokio::test]
    async fn non_array_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"id": 1}"#).unwrap();
        let err = JsonFileSource::new(&path).fetch_records().await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = JsonFileSource::new("definitely/not/here.json")
            .fetch_records()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
