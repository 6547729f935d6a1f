// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod availability;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod metrics;
pub mod normalize;
pub mod ranking;
pub mod recommender;
pub mod scoring;
pub mod taxonomy;
pub mod tone;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::availability::ConstraintChoices;
pub use crate::catalog::{
    CatalogHandle, CatalogSnapshot, CatalogSource, RawVideoRecord, VideoRecord,
};
pub use crate::config::Settings;
pub use crate::context::{ContextFields, FilterContext};
pub use crate::error::{CatalogError, ConfigurationError, RecommendError};
pub use crate::fallback::{FallbackStatus, FlagInfo, Tier, Track};
pub use crate::ranking::ScoredVideo;
pub use crate::recommender::{RecommendationResult, Recommender};
pub use crate::taxonomy::Registry;

use axum::Router;
use std::sync::Arc;
use tracing::info;

/// Registry, first catalog load and router state from `settings`.
pub async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let recommender = settings.build_recommender().await?;
    Ok(AppState {
        recommender,
        default_top_k: settings.default_top_k,
        catalog_source: Arc::new(settings.catalog_source()),
    })
}

/// The full in-process app: API routes, `/metrics`, and the opt-in catalog reload task.
pub async fn app() -> anyhow::Result<Router> {
    let settings = Settings::from_env();
    let metrics = crate::metrics::Metrics::init()?;
    let state = build_state(&settings).await?;

    if let Some(every) = settings.catalog_reload {
        catalog::spawn_reload_task(
            state.recommender.catalog().clone(),
            state.catalog_source.clone(),
            every,
        );
        info!(target: "catalog", every_secs = every.as_secs(), "periodic catalog reload enabled");
    }

    info!(
        target: "recommender",
        records = state.recommender.catalog().snapshot().len(),
        default_top_k = state.default_top_k,
        "recommender ready"
    );
    Ok(create_router(state).merge(metrics.router()))
}
