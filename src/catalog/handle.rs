// src/catalog/handle.rs
//! Shared snapshot handle with whole-snapshot swap, plus an opt-in periodic reload task.

use metrics::{counter, gauge};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::{preprocess_rows, CatalogSnapshot, CatalogSource};
use crate::error::CatalogError;

/// Cheap to clone. Readers grab the current `Arc<CatalogSnapshot>` and keep it for the
/// whole request; a reload replaces the `Arc`, never the rows behind it.
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

/// What a reload did.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReloadOutcome {
    pub records: usize,
    pub warnings: usize,
    pub previous_records: usize,
}

impl CatalogHandle {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        gauge!("catalog_records").set(snapshot.len() as f64);
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    pub fn empty() -> Self {
        Self::new(CatalogSnapshot::empty())
    }

    /// The snapshot a request should read to completion.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            // A writer only ever assigns an Arc, so a poisoned lock still holds a whole snapshot.
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the snapshot; returns the one that was current.
    pub fn swap(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let fresh = Arc::new(snapshot);
        gauge!("catalog_records").set(fresh.len() as f64);
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, fresh)
    }

    /// Fetch, preprocess and swap. Failed fetches keep the current snapshot, and so does
    /// an empty result while the current snapshot still has rows.
    pub async fn reload_from(
        &self,
        source: &dyn CatalogSource,
    ) -> Result<ReloadOutcome, CatalogError> {
        let raw = match source.fetch_records().await {
            Ok(raw) => raw,
            Err(e) => {
                counter!("catalog_reload_total", "outcome" => "error").increment(1);
                tracing::warn!(target: "catalog", source = source.name(), error = %e, "catalog reload failed");
                return Err(e);
            }
        };

        // Build off the request path; readers keep the old Arc meanwhile.
        let snapshot = preprocess_rows(raw);
        let previous = self.snapshot().len();
        if snapshot.is_empty() && previous > 0 {
            counter!("catalog_reload_total", "outcome" => "empty").increment(1);
            tracing::warn!(target: "catalog", source = source.name(), previous, "catalog reload produced no rows; keeping current snapshot");
            return Err(CatalogError::Empty(source.name().to_string()));
        }

        let dropped = snapshot
            .warnings()
            .iter()
            .filter(|w| w.reason.drops_row())
            .count();
        counter!("catalog_malformed_rows_total").increment(dropped as u64);

        let outcome = ReloadOutcome {
            records: snapshot.len(),
            warnings: snapshot.warnings().len(),
            previous_records: previous,
        };
        self.swap(snapshot);

        counter!("catalog_reload_total", "outcome" => "ok").increment(1);
        tracing::info!(
            target: "catalog",
            source = source.name(),
            records = outcome.records,
            warnings = outcome.warnings,
            previous = outcome.previous_records,
            "catalog snapshot swapped"
        );
        Ok(outcome)
    }
}

/// Periodically reload from `source`. The first tick fires after one full interval.
pub fn spawn_reload_task(
    handle: CatalogHandle,
    source: Arc<dyn CatalogSource>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // interval() yields immediately on the first tick; startup already loaded once.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let _ = handle.reload_from(source.as_ref()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{preprocess, RawCount, RawVideoRecord, StaticSource};

    fn rows(ids: &[u64]) -> Vec<RawVideoRecord> {
        ids.iter()
            .map(|&id| RawVideoRecord {
                id: Some(RawCount::Int(id)),
                title: Some(format!("video {id}")),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn captured_snapshot_survives_swap() {
        let handle = CatalogHandle::new(preprocess(rows(&[1, 2])));
        let captured = handle.snapshot();

        let outcome = handle
            .reload_from(&StaticSource::new(rows(&[3, 4, 5])))
            .await
            .unwrap();
        assert_eq!(outcome.records, 3);
        assert_eq!(outcome.previous_records, 2);

        // In-flight reader still sees the old rows in full.
        assert_eq!(captured.len(), 2);
        assert_eq!(handle.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn empty_reload_keeps_current_rows() {
        let handle = CatalogHandle::new(preprocess(rows(&[1])));
        let err = handle
            .reload_from(&StaticSource::new(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Empty(_)));
        assert_eq!(handle.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn first_load_may_be_empty() {
        let handle = CatalogHandle::empty();
        let outcome = handle
            .reload_from(&StaticSource::new(Vec::new()))
            .await
            .unwrap();
        assert_eq!(outcome.records, 0);
    }
}
