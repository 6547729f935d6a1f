// src/availability.rs
//! Which constraint tags can still be picked for a request, before the final query runs.

use serde::Serialize;

use crate::catalog::CatalogSnapshot;
use crate::context::FilterContext;
use crate::error::ConfigurationError;
use crate::fallback::tone_filtered;
use crate::filter::Candidates;
use crate::taxonomy::{DetailKind, Registry};

/// The three lists a step-wise constraint picker needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintChoices {
    pub available: Vec<String>,
    pub compatible: Vec<String>,
    /// Buttons to enable: `[]` when the selection is already a dead end.
    pub enabled: Vec<String>,
}

/// Shared base for both resolver queries.
pub fn base_filter<'a>(
    registry: &Registry,
    ctx: &FilterContext,
    catalog: &'a CatalogSnapshot,
) -> Result<Candidates<'a>, ConfigurationError> {
    let mut set = tone_filtered(registry, ctx, catalog);

    let mut mood_tag_selected = false;
    let mut occasion_tag_selected = false;
    for d in ctx.detail_tags() {
        let rule = match d.kind {
            DetailKind::Mood => {
                mood_tag_selected = true;
                registry.mood_tags().require(&d.tag)?
            }
            DetailKind::Occasion => {
                occasion_tag_selected = true;
                registry.occasion_tags().require(&d.tag)?
            }
        };
        set = set.apply_rule(rule);
    }

    if !occasion_tag_selected {
        if let Some(group) = ctx.occasion_group() {
            set = set.occasion_contains(group);
        }
    }

    if !mood_tag_selected {
        if let Some(key) = ctx.mood_group() {
            set = set.mood_exact_any(&registry.mood_groups().require(key)?.labels);
        }
    }

    if let Some(tag) = ctx.style() {
        set = set.style_text(registry.styles().require(tag)?);
    }

    Ok(set)
}

/// Constraint tags with at least one match over the base set, in registry order.
pub fn available_tags(
    registry: &Registry,
    ctx: &FilterContext,
    catalog: &CatalogSnapshot,
) -> Result<Vec<String>, ConfigurationError> {
    let base = base_filter(registry, ctx, catalog)?;
    Ok(matching_constraints(registry, &base))
}

/// Empty selection → every constraint tag. Otherwise narrow by each selected constraint in
/// order; a dead end at any step → `[]`. Else the selection plus every constraint that
/// still matches, in registry order.
pub fn compatible_tags(
    registry: &Registry,
    selected: &[String],
    ctx: &FilterContext,
    catalog: &CatalogSnapshot,
) -> Result<Vec<String>, ConfigurationError> {
    if selected.is_empty() {
        return Ok(registry.constraint_tags());
    }
    let rules = selected
        .iter()
        .map(|t| registry.constraints().require(t))
        .collect::<Result<Vec<_>, _>>()?;

    let mut set = base_filter(registry, ctx, catalog)?;
    for rule in rules {
        set = set.constraint(rule);
        if set.is_empty() {
            return Ok(Vec::new());
        }
    }

    let mut out: Vec<String> = Vec::new();
    for tag in selected
        .iter()
        .cloned()
        .chain(matching_constraints(registry, &set))
    {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    registry.sort_constraints(&mut out);
    Ok(out)
}

/// `[]` when compatibility is empty, else `(available ∩ compatible) ∪ selected`.
pub fn constraint_choices(
    registry: &Registry,
    selected: &[String],
    ctx: &FilterContext,
    catalog: &CatalogSnapshot,
) -> Result<ConstraintChoices, ConfigurationError> {
    let available = available_tags(registry, ctx, catalog)?;
    let compatible = compatible_tags(registry, selected, ctx, catalog)?;

    let enabled = if compatible.is_empty() {
        Vec::new()
    } else {
        let mut e: Vec<String> = available
            .iter()
            .filter(|t| compatible.contains(t))
            .cloned()
            .collect();
        for s in selected {
            if !e.contains(s) {
                e.push(s.clone());
            }
        }
        registry.sort_constraints(&mut e);
        e
    };

    Ok(ConstraintChoices {
        available,
        compatible,
        enabled,
    })
}

fn matching_constraints(registry: &Registry, set: &Candidates<'_>) -> Vec<String> {
    registry
        .constraints()
        .iter()
        .filter(|(_, rule)| set.any(|r| rule.matches(r)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}
