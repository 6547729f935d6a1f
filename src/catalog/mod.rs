// src/catalog/mod.rs
//! Catalog snapshot: raw rows, preprocessed records, and the shared handle.

pub mod handle;
pub mod preprocess;
pub mod source;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MalformedReason, MalformedRecordWarning};

pub use handle::{spawn_reload_task, CatalogHandle, ReloadOutcome};
pub use preprocess::{preprocess, preprocess_rows};
pub use source::{CatalogSource, JsonFileSource, StaticSource};

pub type VideoId = u64;

/// One loader row, or why it could not be read as a row at all.
pub type RawRow = Result<RawVideoRecord, MalformedReason>;

/// An id or view/like count as it arrives from the loader: number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCount {
    Int(u64),
    Float(f64),
    Text(String),
}

/// One catalog row exactly as the loading collaborator produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVideoRecord {
    #[serde(default, alias = "video_id")]
    pub id: Option<RawCount>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "descriptionKeywords")]
    pub description_keywords: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub moods: Option<String>,
    #[serde(default)]
    pub occasions: Option<String>,
    #[serde(default)]
    pub views: Option<RawCount>,
    #[serde(default)]
    pub likes: Option<RawCount>,
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A preprocessed, immutable catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    pub description_keywords: String,
    pub tone: String,
    pub moods: String,
    pub occasions: String,
    pub views: u64,
    pub likes: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub channel: String,
    pub url: String,
    /// Trimmed, case-folded mood labels (empties dropped).
    pub moods_list: Vec<String>,
    /// Trimmed, case-folded occasion labels (empties dropped).
    pub occasions_list: Vec<String>,
    /// `normalize_text(title + " " + description_keywords)`.
    pub normalized_text: String,
}

impl VideoRecord {
    /// Mood labels followed by occasion labels.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.moods_list
            .iter()
            .chain(self.occasions_list.iter())
            .map(String::as_str)
    }
}

/// Read-only catalog shared by every in-flight request.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    records: Vec<VideoRecord>,
    warnings: Vec<MalformedRecordWarning>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub(crate) fn new(
        records: Vec<VideoRecord>,
        warnings: Vec<MalformedRecordWarning>,
        loaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            records,
            warnings,
            loaded_at,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Utc::now())
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn warnings(&self) -> &[MalformedRecordWarning] {
        &self.warnings
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn get(&self, row: usize) -> Option<&VideoRecord> {
        self.records.get(row)
    }
}
