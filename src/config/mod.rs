// src/config/mod.rs
//! Process settings from env (after `dotenvy`), plus the startup wiring that turns them
//! into a ready `Recommender`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{CatalogHandle, JsonFileSource};
use crate::context::DEFAULT_TOP_K;
use crate::recommender::Recommender;
use crate::taxonomy::Registry;

pub use crate::taxonomy::config::{DEFAULT_TAXONOMY_PATH, ENV_TAXONOMY_PATH};

pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";

pub const ENV_CATALOG_PATH: &str = "CATALOG_PATH";
pub const ENV_DEFAULT_TOP_K: &str = "DEFAULT_TOP_K";
pub const ENV_CATALOG_RELOAD_SECS: &str = "CATALOG_RELOAD_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog_path: PathBuf,
    /// `None` → the embedded default taxonomy.
    pub taxonomy_path: Option<PathBuf>,
    pub default_top_k: usize,
    /// `None` → no periodic reload.
    pub catalog_reload: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            taxonomy_path: None,
            default_top_k: DEFAULT_TOP_K,
            catalog_reload: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Unparseable or out-of-range numbers fall back to their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let catalog_path = non_empty(ENV_CATALOG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        let taxonomy_path = non_empty(ENV_TAXONOMY_PATH).map(PathBuf::from);
        let default_top_k = non_empty(ENV_DEFAULT_TOP_K)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|k| *k >= 1)
            .unwrap_or(DEFAULT_TOP_K);
        let catalog_reload = non_empty(ENV_CATALOG_RELOAD_SECS)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs);

        Self {
            catalog_path,
            taxonomy_path,
            default_top_k,
            catalog_reload,
        }
    }

    pub fn load_registry(&self) -> Result<Registry> {
        let path = self.taxonomy_path.as_deref();
        Registry::load(path).with_context(|| match path {
            Some(p) => format!("loading taxonomy from {}", p.display()),
            None => "compiling embedded taxonomy".to_string(),
        })
    }

    pub fn catalog_source(&self) -> JsonFileSource {
        JsonFileSource::new(&self.catalog_path)
    }

    /// Registry + first catalog load. A missing catalog file starts the service empty;
    /// an unreadable file or one that is not JSON rows is an error. Mistyped rows are
    /// skipped with a warning.
    pub async fn build_recommender(&self) -> Result<Recommender> {
        let registry = self.load_registry()?;
        let handle = CatalogHandle::empty();
        if self.catalog_path.is_file() {
            handle
                .reload_from(&self.catalog_source())
                .await
                .with_context(|| {
                    format!("loading catalog from {}", self.catalog_path.display())
                })?;
        } else {
            tracing::warn!(
                target: "catalog",
                path = %self.catalog_path.display(),
                "catalog file not found; starting with an empty catalog"
            );
        }
        Ok(Recommender::new(registry, handle))
    }
}
