// src/taxonomy/mod.rs
//! Tag taxonomy registry: tone groups, broad mood groups, and the four rule tables.
//! Loaded from TOML once, validated, regexes precompiled. Read-only afterwards.

pub mod config;
pub mod rules;

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ConfigurationError, RuleTable};
use crate::normalize::normalize_text;
use crate::tone::ToneTable;

use config::{RuleKind, TagRuleCfg, TaxonomyFile, DEFAULT_TAXONOMY_TOML};
pub use rules::{ConstraintRule, StyleRule, TagRule};

/// Which detail table a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Occasion,
    Mood,
}

/// Broad mood group: UI key → catalog mood labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodGroup {
    pub key: String,
    pub display: String,
    pub labels: Vec<String>,
}

/// Tag-keyed table that keeps file order (constraint listings are returned in it).
#[derive(Debug, Clone)]
pub struct RuleSet<R> {
    table: RuleTable,
    entries: Vec<(String, R)>,
    index: HashMap<String, usize>,
}

impl<R> RuleSet<R> {
    fn new(table: RuleTable) -> Self {
        Self {
            table,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn insert(&mut self, tag: String, rule: R) -> Result<(), ConfigurationError> {
        if self.index.contains_key(&tag) {
            return Err(ConfigurationError::DuplicateTag {
                table: self.table,
                tag,
            });
        }
        self.index.insert(tag.clone(), self.entries.len());
        self.entries.push((tag, rule));
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&R> {
        self.index.get(tag).map(|&i| &self.entries[i].1)
    }

    pub fn require(&self, tag: &str) -> Result<&R, ConfigurationError> {
        self.get(tag).ok_or_else(|| ConfigurationError::UnknownTag {
            table: self.table,
            tag: tag.to_string(),
        })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries.iter().map(|(t, r)| (t.as_str(), r))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    /// Registry position of a tag; used to restore registry order on tag lists.
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    tones: ToneTable,
    mood_groups: RuleSet<MoodGroup>,
    occasion_tags: RuleSet<TagRule>,
    mood_tags: RuleSet<TagRule>,
    styles: RuleSet<StyleRule>,
    constraints: RuleSet<ConstraintRule>,
}

impl Registry {
    /// The taxonomy shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::from_toml_str(DEFAULT_TAXONOMY_TOML)
    }

    /// `Some(path)` reads that file; `None` uses the embedded default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::builtin(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let reg = Self::from_toml_str(&content)?;
        tracing::info!(target: "taxonomy", path = %path.display(), "taxonomy loaded from file");
        Ok(reg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigurationError> {
        let file: TaxonomyFile = toml::from_str(toml_str)?;
        Self::compile(file)
    }

    pub fn compile(file: TaxonomyFile) -> Result<Self, ConfigurationError> {
        let tones = ToneTable::new(file.tones.warm, file.tones.cool, file.tones.unclassified)?;

        let mut mood_groups = RuleSet::new(RuleTable::MoodGroup);
        for g in file.mood_groups {
            let key = g.key.trim().to_string();
            let labels = clean_labels(&g.labels);
            if labels.is_empty() {
                return Err(ConfigurationError::EmptyRule {
                    table: RuleTable::MoodGroup,
                    tag: key,
                    reason: "no labels",
                });
            }
            let display = g.display.unwrap_or_else(|| key.clone());
            mood_groups.insert(
                key.clone(),
                MoodGroup {
                    key,
                    display,
                    labels,
                },
            )?;
        }

        let occasion_tags = compile_tag_table(RuleTable::Occasion, file.occasion_tags)?;
        let mood_tags = compile_tag_table(RuleTable::Mood, file.mood_tags)?;
        if let Some(tag) = occasion_tags.tags().find(|t| mood_tags.contains(t)) {
            return Err(ConfigurationError::AmbiguousTag {
                tag: tag.to_string(),
            });
        }

        let mut styles = RuleSet::new(RuleTable::Style);
        for s in file.styles {
            let tag = s.tag.trim().to_string();
            let rule = StyleRule::new(&tag, clean_keywords(&s.include), s.hard_ids)?;
            styles.insert(tag, rule)?;
        }

        let mut constraints = RuleSet::new(RuleTable::Constraint);
        for c in file.constraints {
            let tag = c.tag.trim().to_string();
            let rule = ConstraintRule::compile(&tag, &c.patterns)?;
            constraints.insert(tag, rule)?;
        }

        let reg = Self {
            tones,
            mood_groups,
            occasion_tags,
            mood_tags,
            styles,
            constraints,
        };
        tracing::debug!(
            target: "taxonomy",
            occasion_tags = reg.occasion_tags.len(),
            mood_tags = reg.mood_tags.len(),
            styles = reg.styles.len(),
            constraints = reg.constraints.len(),
            mood_groups = reg.mood_groups.len(),
            "taxonomy compiled"
        );
        Ok(reg)
    }

    pub fn tones(&self) -> &ToneTable {
        &self.tones
    }

    pub fn mood_groups(&self) -> &RuleSet<MoodGroup> {
        &self.mood_groups
    }

    pub fn occasion_tags(&self) -> &RuleSet<TagRule> {
        &self.occasion_tags
    }

    pub fn mood_tags(&self) -> &RuleSet<TagRule> {
        &self.mood_tags
    }

    pub fn styles(&self) -> &RuleSet<StyleRule> {
        &self.styles
    }

    pub fn constraints(&self) -> &RuleSet<ConstraintRule> {
        &self.constraints
    }

    /// Classify a detail tag into the occasion or mood table.
    pub fn detail_kind(&self, tag: &str) -> Option<DetailKind> {
        if self.occasion_tags.contains(tag) {
            Some(DetailKind::Occasion)
        } else if self.mood_tags.contains(tag) {
            Some(DetailKind::Mood)
        } else {
            None
        }
    }

    /// Every constraint tag, in registry order.
    pub fn constraint_tags(&self) -> Vec<String> {
        self.constraints.tags().map(str::to_string).collect()
    }

    /// Sort tags by constraint registry position; unknown tags go last, in input order.
    pub(crate) fn sort_constraints(&self, tags: &mut [String]) {
        tags.sort_by_key(|t| self.constraints.position(t).unwrap_or(usize::MAX));
    }

    /// Serializable listing for UIs.
    pub fn tags(&self) -> TaxonomyView {
        let detail = |set: &RuleSet<TagRule>| {
            set.iter()
                .map(|(tag, rule)| TagSummary {
                    tag: tag.to_string(),
                    kind: rule.kind(),
                })
                .collect()
        };
        TaxonomyView {
            tones: self.tones.clone(),
            mood_groups: self.mood_groups.iter().map(|(_, g)| g.clone()).collect(),
            occasion_tags: detail(&self.occasion_tags),
            mood_tags: detail(&self.mood_tags),
            styles: self.styles.tags().map(str::to_string).collect(),
            constraints: self.constraint_tags(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    pub tag: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyView {
    pub tones: ToneTable,
    pub mood_groups: Vec<MoodGroup>,
    pub occasion_tags: Vec<TagSummary>,
    pub mood_tags: Vec<TagSummary>,
    pub styles: Vec<String>,
    pub constraints: Vec<String>,
}

fn compile_tag_table(
    table: RuleTable,
    cfgs: Vec<TagRuleCfg>,
) -> Result<RuleSet<TagRule>, ConfigurationError> {
    let mut set = RuleSet::new(table);
    for c in cfgs {
        let tag = c.tag.trim().to_string();
        let labels = clean_labels(&c.labels);
        let keywords = clean_keywords(&c.keywords);
        let empty = |reason| ConfigurationError::EmptyRule {
            table,
            tag: tag.clone(),
            reason,
        };
        let rule = match c.kind {
            RuleKind::Label if labels.is_empty() => return Err(empty("label rule without labels")),
            RuleKind::Label => TagRule::Label { labels },
            RuleKind::Text if keywords.is_empty() => {
                return Err(empty("text rule without keywords"))
            }
            RuleKind::Text => TagRule::Text { keywords },
            RuleKind::Hybrid if labels.is_empty() || keywords.is_empty() => {
                return Err(empty("hybrid rule needs labels and keywords"))
            }
            RuleKind::Hybrid => TagRule::Hybrid { labels, keywords },
        };
        set.insert(tag, rule)?;
    }
    Ok(set)
}

/// Labels compare against case-folded catalog labels.
fn clean_labels(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Keywords compare against normalized text, so they are normalized the same way.
fn clean_keywords(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|k| normalize_text(k))
        .filter(|k| !k.is_empty())
        .collect()
}
