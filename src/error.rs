//! Error taxonomy.
//!
//! - `ConfigurationError`: structural problems (unknown tags, bad regexes, bad K).
//!   Surfaced immediately; never degraded into an unfiltered query.
//! - `CatalogError`: the catalog source could not be read or produced nothing usable.
//! - `MalformedRecordWarning`: a single row failed preprocessing and was handled
//!   per-row; collected on the snapshot, never raised.
//! - `RecommendError`: umbrella used at the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Which registry table a tag was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTable {
    Occasion,
    Mood,
    MoodGroup,
    Style,
    Constraint,
    /// Detail tags may live in either the occasion or the mood table.
    Detail,
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleTable::Occasion => "occasion",
            RuleTable::Mood => "mood",
            RuleTable::MoodGroup => "mood group",
            RuleTable::Style => "style",
            RuleTable::Constraint => "constraint",
            RuleTable::Detail => "detail",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("unknown {table} tag `{tag}`")]
    UnknownTag { table: RuleTable, tag: String },

    #[error("duplicate {table} tag `{tag}`")]
    DuplicateTag { table: RuleTable, tag: String },

    #[error("tag `{tag}` is defined in both the occasion and mood tables")]
    AmbiguousTag { tag: String },

    #[error("{table} rule `{tag}` is empty: {reason}")]
    EmptyRule {
        table: RuleTable,
        tag: String,
        reason: &'static str,
    },

    #[error("{table} rule `{tag}` pattern `{pattern}` is invalid: {source}")]
    InvalidPattern {
        table: RuleTable,
        tag: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("top_k must be at least 1 (got {0})")]
    InvalidTopK(usize),

    #[error("tone table is invalid: {0}")]
    InvalidToneTable(&'static str),

    #[error("taxonomy parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read taxonomy at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog source `{0}` produced no usable records")]
    Empty(String),
}

/// Why a raw row was dropped or degraded during preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedReason {
    MissingId,
    InvalidId { value: String },
    DuplicateId,
    InvalidCount { field: &'static str, value: String },
    UnparseableDate { value: String },
    /// The row is not a JSON object of the expected field types.
    InvalidShape { detail: String },
}

impl MalformedReason {
    /// Whether the row is excluded from the snapshot.
    pub fn drops_row(&self) -> bool {
        !matches!(self, MalformedReason::UnparseableDate { .. })
    }
}

/// A per-row preprocessing problem. Recorded on the snapshot; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRecordWarning {
    /// 0-based position in the raw batch.
    pub row: usize,
    pub id: Option<u64>,
    pub reason: MalformedReason,
}

impl fmt::Display for MalformedRecordWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MalformedReason::MissingId => write!(f, "row {}: missing id", self.row),
            MalformedReason::InvalidId { value } => {
                write!(f, "row {}: invalid id `{}`", self.row, value)
            }
            MalformedReason::DuplicateId => {
                write!(f, "row {}: duplicate id {:?}", self.row, self.id)
            }
            MalformedReason::InvalidCount { field, value } => {
                write!(f, "row {}: non-numeric {} `{}`", self.row, field, value)
            }
            MalformedReason::UnparseableDate { value } => {
                write!(f, "row {}: unparseable published_at `{}`", self.row, value)
            }
            MalformedReason::InvalidShape { detail } => {
                write!(f, "row {}: malformed row ({})", self.row, detail)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RecommendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for RecommendError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecommendError::Configuration(_) => StatusCode::BAD_REQUEST,
            RecommendError::Catalog(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type RecommendResult<T> = Result<T, RecommendError>;
