// src/recommender.rs
//! Public façade: one registry, one catalog handle, request-scoped everything else.

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::availability::{self, ConstraintChoices};
use crate::catalog::{CatalogHandle, CatalogSource, ReloadOutcome};
use crate::context::{ContextFields, FilterContext};
use crate::error::{CatalogError, ConfigurationError};
use crate::fallback::{tone_filtered, FlagInfo, TierPlan};
use crate::ranking::{rank, ScoredVideo};
use crate::scoring::Scorer;
use crate::taxonomy::Registry;

pub const ENV_DEV_LOG: &str = "RECOMMENDER_DEV_LOG";

/// Ranked rows (≤ K) plus how far the request had to be relaxed. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub results: Vec<ScoredVideo>,
    pub flag: FlagInfo,
}

#[derive(Clone)]
pub struct Recommender {
    registry: Arc<Registry>,
    catalog: CatalogHandle,
}

impl Recommender {
    pub fn new(registry: Registry, catalog: CatalogHandle) -> Self {
        Self {
            registry: Arc::new(registry),
            catalog,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Validate wire fields against this recommender's registry.
    pub fn context(&self, fields: ContextFields) -> Result<FilterContext, ConfigurationError> {
        fields.into_context(&self.registry)
    }

    pub fn recommend(
        &self,
        ctx: &FilterContext,
    ) -> Result<RecommendationResult, ConfigurationError> {
        self.recommend_at(ctx, Utc::now())
    }

    /// Same as `recommend` with an explicit clock for the recency term.
    pub fn recommend_at(
        &self,
        ctx: &FilterContext,
        now: DateTime<Utc>,
    ) -> Result<RecommendationResult, ConfigurationError> {
        let started = Instant::now();
        // One snapshot for the whole request, whatever reloads happen meanwhile.
        let snapshot = self.catalog.snapshot();

        let scorer = Scorer::new(&self.registry, ctx, now)?;
        let plan = TierPlan::build(&self.registry, ctx, scorer.occasion_labels())?;
        let toned = tone_filtered(&self.registry, ctx, &snapshot);
        let (candidates, flag) = plan.run(&toned);
        let results = rank(&candidates, &scorer, ctx.top_k());

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!(
            "recommend_requests_total",
            "status" => flag.status.as_str(),
            "track" => flag.track.as_str()
        )
        .increment(1);
        histogram!("recommend_latency_ms").record(elapsed_ms);

        dev_log_recommend(ctx, &flag, candidates.len(), &results);

        Ok(RecommendationResult { results, flag })
    }

    pub fn available_tags(&self, ctx: &FilterContext) -> Result<Vec<String>, ConfigurationError> {
        availability::available_tags(&self.registry, ctx, &self.catalog.snapshot())
    }

    pub fn compatible_tags(
        &self,
        selected: &[String],
        ctx: &FilterContext,
    ) -> Result<Vec<String>, ConfigurationError> {
        availability::compatible_tags(&self.registry, selected, ctx, &self.catalog.snapshot())
    }

    pub fn constraint_choices(
        &self,
        selected: &[String],
        ctx: &FilterContext,
    ) -> Result<ConstraintChoices, ConfigurationError> {
        availability::constraint_choices(&self.registry, selected, ctx, &self.catalog.snapshot())
    }

    /// Whole-snapshot swap from `source`; in-flight requests keep their snapshot.
    pub async fn reload(
        &self,
        source: &dyn CatalogSource,
    ) -> Result<ReloadOutcome, CatalogError> {
        self.catalog.reload_from(source).await
    }
}

/// Opt-in request diagnostics, honored only in a debug build or a local/dev Shuttle env.
pub(crate) fn dev_logging_enabled() -> bool {
    let requested = matches!(std::env::var(ENV_DEV_LOG).as_deref(), Ok("1"));
    let dev_env = cfg!(debug_assertions)
        || std::env::var("SHUTTLE_ENV")
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "local" | "development" | "dev"))
            .unwrap_or(false);
    requested && dev_env
}

/// The selection that decides the result set, in a fixed field order. K and the
/// ignore-tone switch are left out so one selection maps to one key.
pub(crate) fn context_key(ctx: &FilterContext) -> String {
    let details: Vec<&str> = ctx.detail_tags().iter().map(|d| d.tag.as_str()).collect();
    [
        ctx.tone().unwrap_or_default(),
        ctx.occasion_group().unwrap_or_default(),
        ctx.mood_group().unwrap_or_default(),
        details.join(",").as_str(),
        ctx.constraints().join(",").as_str(),
        ctx.style().unwrap_or_default(),
    ]
    .join("|")
}

/// 12 hex chars of SHA-256 over `context_key`; correlates repeat requests without
/// logging any tag.
pub(crate) fn request_fingerprint(ctx: &FilterContext) -> String {
    use sha2::{Digest, Sha256};
    Sha256::digest(context_key(ctx).as_bytes())
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn dev_log_recommend(
    ctx: &FilterContext,
    flag: &FlagInfo,
    candidates: usize,
    results: &[ScoredVideo],
) {
    if !dev_logging_enabled() {
        return;
    }
    let id = request_fingerprint(ctx);
    let top: Vec<u64> = results.iter().take(5).map(|r| r.id).collect();
    info!(
        target: "recommender",
        %id,
        status = flag.status.as_str(),
        track = flag.track.as_str(),
        tier = ?flag.tier,
        candidates,
        returned = results.len(),
        top = ?top
    );
}
