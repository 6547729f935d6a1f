// src/taxonomy/config.rs
//! On-disk taxonomy schema (TOML). Compiled into a `Registry` by `Registry::from_toml_str`.

use serde::Deserialize;

use crate::tone::DEFAULT_UNCLASSIFIED_TONE;

pub const DEFAULT_TAXONOMY_PATH: &str = "config/taxonomy.toml";
pub const ENV_TAXONOMY_PATH: &str = "TAXONOMY_PATH";

/// Compiled into the binary so the service starts without any files on disk.
pub const DEFAULT_TAXONOMY_TOML: &str = include_str!("../../config/taxonomy.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyFile {
    pub tones: TonesCfg,
    #[serde(default)]
    pub mood_groups: Vec<MoodGroupCfg>,
    #[serde(default)]
    pub occasion_tags: Vec<TagRuleCfg>,
    #[serde(default)]
    pub mood_tags: Vec<TagRuleCfg>,
    #[serde(default)]
    pub styles: Vec<StyleCfg>,
    #[serde(default)]
    pub constraints: Vec<ConstraintCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TonesCfg {
    pub warm: Vec<String>,
    pub cool: Vec<String>,
    #[serde(default = "default_unclassified")]
    pub unclassified: String,
}

fn default_unclassified() -> String {
    DEFAULT_UNCLASSIFIED_TONE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoodGroupCfg {
    pub key: String,
    #[serde(default)]
    pub display: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Label,
    Text,
    Hybrid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRuleCfg {
    pub tag: String,
    pub kind: RuleKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleCfg {
    pub tag: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub hard_ids: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstraintCfg {
    pub tag: String,
    pub patterns: Vec<String>, // regex, single-quoted in TOML
}
