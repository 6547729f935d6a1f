// src/filter.rs
//! Filter engine. A `Candidates` value is a row-index view over one snapshot;
//! every narrowing op returns a new view that is a subset of its input.

use crate::catalog::{CatalogSnapshot, VideoId, VideoRecord};
use crate::taxonomy::{ConstraintRule, StyleRule, TagRule};
use crate::tone::{ToneGroup, ToneTable};

#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    catalog: &'a CatalogSnapshot,
    rows: Vec<usize>,
}

impl<'a> Candidates<'a> {
    /// Every row of the snapshot.
    pub fn all(catalog: &'a CatalogSnapshot) -> Self {
        Self {
            catalog,
            rows: (0..catalog.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn catalog(&self) -> &'a CatalogSnapshot {
        self.catalog
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a VideoRecord> + '_ {
        let catalog = self.catalog;
        self.rows.iter().filter_map(move |&i| catalog.get(i))
    }

    pub fn ids(&self) -> Vec<VideoId> {
        self.iter().map(|r| r.id).collect()
    }

    /// Keep rows satisfying `pred`.
    pub fn retain_where(&self, pred: impl Fn(&VideoRecord) -> bool) -> Self {
        let rows = self
            .rows
            .iter()
            .copied()
            .filter(|&i| self.catalog.get(i).is_some_and(&pred))
            .collect();
        Self {
            catalog: self.catalog,
            rows,
        }
    }

    pub fn apply_rule(&self, rule: &TagRule) -> Self {
        self.retain_where(|r| rule.matches(r))
    }

    pub fn tone_group(&self, tones: &ToneTable, group: ToneGroup) -> Self {
        self.retain_where(|r| tones.in_group(&r.tone, group))
    }

    /// Rows whose occasion labels contain `label` as a substring of some element.
    pub fn occasion_contains(&self, label: &str) -> Self {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        self.retain_where(|r| r.occasions_list.iter().any(|o| o.contains(needle.as_str())))
    }

    /// Rows whose occasions contain ANY of `labels` (substring of an element).
    pub fn occasion_any(&self, labels: &[String]) -> Self {
        self.retain_where(|r| {
            labels
                .iter()
                .any(|l| r.occasions_list.iter().any(|o| o.contains(l.as_str())))
        })
    }

    /// Broad mood, substring flavor: some mood label contains some group label.
    pub fn mood_contains_any(&self, labels: &[String]) -> Self {
        self.retain_where(|r| {
            labels
                .iter()
                .any(|l| r.moods_list.iter().any(|m| m.contains(l.as_str())))
        })
    }

    /// Broad mood, exact flavor: some mood label equals some group label.
    pub fn mood_exact_any(&self, labels: &[String]) -> Self {
        self.retain_where(|r| r.moods_list.iter().any(|m| labels.contains(m)))
    }

    pub fn constraint(&self, rule: &ConstraintRule) -> Self {
        self.retain_where(|r| rule.matches(r))
    }

    /// Style text hit OR hard id.
    pub fn style(&self, rule: &StyleRule) -> Self {
        self.retain_where(|r| rule.matches(r))
    }

    /// Style include keywords only (no hard ids).
    pub fn style_text(&self, rule: &StyleRule) -> Self {
        self.retain_where(|r| rule.text_hit(&r.normalized_text))
    }

    /// Whether any row satisfies `pred`, without building a view.
    pub fn any(&self, pred: impl Fn(&VideoRecord) -> bool) -> bool {
        self.iter().any(pred)
    }
}

/// Rows of `catalog` matching `rule`.
pub fn apply_rule<'a>(catalog: &'a CatalogSnapshot, rule: &TagRule) -> Candidates<'a> {
    Candidates::all(catalog).apply_rule(rule)
}
