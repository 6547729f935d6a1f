// src/catalog/preprocess.rs
//! Raw rows → immutable `CatalogSnapshot`. Bad rows are dropped one by one, never the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;

use super::{CatalogSnapshot, RawCount, RawRow, RawVideoRecord, VideoId, VideoRecord};
use crate::error::{MalformedReason, MalformedRecordWarning};
use crate::normalize::normalize_text;

/// Build a snapshot from rows that are already typed.
pub fn preprocess(raw: Vec<RawVideoRecord>) -> CatalogSnapshot {
    preprocess_rows(raw.into_iter().map(Ok).collect())
}

/// Build a snapshot from raw loader output. Rows the loader could not shape into a
/// `RawVideoRecord` are recorded as warnings at their batch position.
pub fn preprocess_rows(raw: Vec<RawRow>) -> CatalogSnapshot {
    let mut records = Vec::with_capacity(raw.len());
    let mut warnings = Vec::new();
    let mut seen: HashSet<VideoId> = HashSet::with_capacity(raw.len());

    for (row, r) in raw.into_iter().enumerate() {
        let r = match r {
            Ok(r) => r,
            Err(reason) => {
                warnings.push(MalformedRecordWarning {
                    row,
                    id: None,
                    reason,
                });
                continue;
            }
        };
        let Some(rec) = build_record(row, r, &mut warnings) else {
            continue;
        };
        if !seen.insert(rec.id) {
            warnings.push(MalformedRecordWarning {
                row,
                id: Some(rec.id),
                reason: MalformedReason::DuplicateId,
            });
            continue;
        }
        records.push(rec);
    }

    for w in &warnings {
        tracing::warn!(target: "catalog", row = w.row, id = ?w.id, dropped = w.reason.drops_row(), "{}", w);
    }

    CatalogSnapshot::new(records, warnings, Utc::now())
}

fn build_record(
    row: usize,
    r: RawVideoRecord,
    warnings: &mut Vec<MalformedRecordWarning>,
) -> Option<VideoRecord> {
    let id = match r.id.as_ref().map(parse_id) {
        Some(Ok(id)) => id,
        Some(Err(value)) => {
            warnings.push(MalformedRecordWarning {
                row,
                id: None,
                reason: MalformedReason::InvalidId { value },
            });
            return None;
        }
        None => {
            warnings.push(MalformedRecordWarning {
                row,
                id: None,
                reason: MalformedReason::MissingId,
            });
            return None;
        }
    };

    let views = match parse_count(r.views.as_ref()) {
        Ok(v) => v,
        Err(value) => {
            warnings.push(MalformedRecordWarning {
                row,
                id: Some(id),
                reason: MalformedReason::InvalidCount {
                    field: "views",
                    value,
                },
            });
            return None;
        }
    };
    let likes = match parse_count(r.likes.as_ref()) {
        Ok(v) => v,
        Err(value) => {
            warnings.push(MalformedRecordWarning {
                row,
                id: Some(id),
                reason: MalformedReason::InvalidCount {
                    field: "likes",
                    value,
                },
            });
            return None;
        }
    };

    let published_raw = r.published_at.unwrap_or_default();
    let published_at = if published_raw.trim().is_empty() {
        None
    } else {
        let parsed = parse_published_at(&published_raw);
        if parsed.is_none() {
            // Row stays; quality scoring treats it as recency 0.
            warnings.push(MalformedRecordWarning {
                row,
                id: Some(id),
                reason: MalformedReason::UnparseableDate {
                    value: published_raw.clone(),
                },
            });
        }
        parsed
    };

    let title = r.title.unwrap_or_default();
    let description_keywords = r.description_keywords.unwrap_or_default();
    let moods = r.moods.unwrap_or_default();
    let occasions = r.occasions.unwrap_or_default();
    let normalized_text = normalize_text(&format!("{} {}", title, description_keywords));

    Some(VideoRecord {
        id,
        moods_list: split_labels(&moods),
        occasions_list: split_labels(&occasions),
        normalized_text,
        title,
        description_keywords,
        tone: r.tone.unwrap_or_default().trim().to_string(),
        moods,
        occasions,
        views,
        likes,
        published_at,
        channel: r.channel.unwrap_or_default(),
        url: r.url.unwrap_or_default(),
    })
}

/// Comma-separated label list → trimmed, case-folded, non-empty labels.
pub(crate) fn split_labels(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn parse_id(raw: &RawCount) -> Result<VideoId, String> {
    match raw {
        RawCount::Int(n) => Ok(*n),
        RawCount::Float(f) if f.fract() == 0.0 => float_to_u64(*f).ok_or_else(|| f.to_string()),
        RawCount::Float(f) => Err(f.to_string()),
        RawCount::Text(s) => s.trim().parse::<u64>().map_err(|_| s.clone()),
    }
}

/// Missing counts default to 0; anything present must be a non-negative number.
fn parse_count(raw: Option<&RawCount>) -> Result<u64, String> {
    match raw {
        None => Ok(0),
        Some(RawCount::Int(n)) => Ok(*n),
        Some(RawCount::Float(f)) => float_to_u64(*f).ok_or_else(|| f.to_string()),
        Some(RawCount::Text(s)) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return Ok(0);
            }
            if let Ok(n) = cleaned.parse::<u64>() {
                return Ok(n);
            }
            cleaned
                .parse::<f64>()
                .ok()
                .and_then(float_to_u64)
                .ok_or_else(|| s.clone())
        }
    }
}

/// Non-negative, finite and below 2^64; `as` would saturate silently.
fn float_to_u64(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f < u64::MAX as f64).then(|| f.trunc() as u64)
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS`, or `YYYY-MM-DD` (UTC).
pub(crate) fn parse_published_at(s: &str) -> Option<DateTime<Utc>> {
    let t = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(n) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(n.and_utc());
        }
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}
