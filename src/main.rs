//! Makeup recommender service: binary entrypoint.
//! Boots the Axum HTTP server via Shuttle; all wiring lives in the library crate.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recommender=info,catalog=info,taxonomy=info,warn"));

    // The runtime may already have installed a subscriber; keep whichever came first.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables CATALOG_PATH / TAXONOMY_PATH / DEFAULT_TOP_K / CATALOG_RELOAD_SECS.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = makeup_recommender::app().await?;
    Ok(router.into())
}
