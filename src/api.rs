// src/api.rs
//! Thin JSON boundary over `Recommender`.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::availability::ConstraintChoices;
use crate::catalog::{CatalogSource, ReloadOutcome};
use crate::context::{ContextFields, FilterContext};
use crate::error::{RecommendError, RecommendResult};
use crate::recommender::{RecommendationResult, Recommender};
use crate::taxonomy::TaxonomyView;

#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    /// K used when a request omits `top_k`.
    pub default_top_k: usize,
    /// Where `/admin/reload-catalog` re-reads from.
    pub catalog_source: Arc<dyn CatalogSource>,
}

impl AppState {
    fn context(&self, mut fields: ContextFields) -> RecommendResult<FilterContext> {
        fields.top_k.get_or_insert(self.default_top_k);
        Ok(self.recommender.context(fields)?)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/taxonomy", get(taxonomy))
        .route("/catalog", get(catalog_info))
        .route("/recommend", post(recommend))
        .route("/tags/available", post(tags_available))
        .route("/tags/compatible", post(tags_compatible))
        .route("/tags/choices", post(tags_choices))
        .route("/admin/reload-catalog", post(admin_reload_catalog))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Context fields plus the constraint tags already toggled on.
#[derive(Debug, Deserialize)]
struct TagQuery {
    #[serde(flatten)]
    context: ContextFields,
    #[serde(default)]
    selected: Vec<String>,
}

#[derive(Serialize)]
struct AvailableResp {
    available: Vec<String>,
}

#[derive(Serialize)]
struct CompatibleResp {
    compatible: Vec<String>,
}

#[derive(Serialize)]
struct CatalogInfo {
    records: usize,
    warnings: usize,
    loaded_at: DateTime<Utc>,
}

async fn taxonomy(State(state): State<AppState>) -> Json<TaxonomyView> {
    Json(state.recommender.registry().tags())
}

async fn catalog_info(State(state): State<AppState>) -> Json<CatalogInfo> {
    let snap = state.recommender.catalog().snapshot();
    Json(CatalogInfo {
        records: snap.len(),
        warnings: snap.warnings().len(),
        loaded_at: snap.loaded_at(),
    })
}

async fn recommend(
    State(state): State<AppState>,
    Json(fields): Json<ContextFields>,
) -> RecommendResult<Json<RecommendationResult>> {
    let result = state
        .context(fields)
        .and_then(|ctx| Ok(state.recommender.recommend(&ctx)?));
    match result {
        Ok(r) => Ok(Json(r)),
        Err(e) => {
            counter!("recommend_requests_total", "status" => "invalid", "track" => "none")
                .increment(1);
            tracing::debug!(target: "api", error = %e, "rejected recommend request");
            Err(e)
        }
    }
}

async fn tags_available(
    State(state): State<AppState>,
    Json(fields): Json<ContextFields>,
) -> RecommendResult<Json<AvailableResp>> {
    let ctx = state.context(fields)?;
    let available = state.recommender.available_tags(&ctx)?;
    Ok(Json(AvailableResp { available }))
}

async fn tags_compatible(
    State(state): State<AppState>,
    Json(q): Json<TagQuery>,
) -> RecommendResult<Json<CompatibleResp>> {
    let ctx = state.context(q.context)?;
    let compatible = state.recommender.compatible_tags(&q.selected, &ctx)?;
    Ok(Json(CompatibleResp { compatible }))
}

async fn tags_choices(
    State(state): State<AppState>,
    Json(q): Json<TagQuery>,
) -> RecommendResult<Json<ConstraintChoices>> {
    let ctx = state.context(q.context)?;
    Ok(Json(state.recommender.constraint_choices(&q.selected, &ctx)?))
}

async fn admin_reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<ReloadOutcome>, RecommendError> {
    let outcome = state
        .recommender
        .reload(state.catalog_source.as_ref())
        .await?;
    Ok(Json(outcome))
}
