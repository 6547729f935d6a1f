// src/scoring.rs
//! Per-row scorers. Pure functions of (record, request); `now` is injected so quality
//! scores are reproducible.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::VideoRecord;
use crate::context::FilterContext;
use crate::error::ConfigurationError;
use crate::taxonomy::{ConstraintRule, Registry, StyleRule};
use crate::tone::ToneTable;

/// Flat bonus per satisfied constraint/style pattern group.
pub const GROUP_BONUS: f64 = 1500.0;
/// Flat bonus for a curated hard id of the selected style.
pub const HARD_ID_BONUS: f64 = 100.0;
/// Recency decays to 0.5 after this many days.
pub const RECENCY_SCALE_DAYS: f64 = 730.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub tpo: f64,
    pub mood: f64,
    pub tone: f64,
    pub quality: f64,
    pub bonus: f64,
}

/// `1 / (1 + days/730)`; missing date → 0; future dates clamp to 1.
pub fn recency(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published_at {
        Some(p) => {
            let days = (now - p).num_days().max(0) as f64;
            1.0 / (1.0 + days / RECENCY_SCALE_DAYS)
        }
        None => 0.0,
    }
}

/// Engagement (log-scaled, likes weighted over views) blended with recency, scaled ×10.
pub fn quality_score(rec: &VideoRecord, now: DateTime<Utc>) -> f64 {
    let views = (rec.views as f64).ln_1p();
    let likes = (rec.likes as f64).ln_1p();
    ((views * 0.3 + likes * 0.7) / 15.0 * 0.7 + recency(rec.published_at, now) * 0.3) * 10.0
}

/// Share of selected occasion labels present in the record's occasion list, ×100.
pub fn tpo_ratio(selected: &[String], rec: &VideoRecord) -> f64 {
    if selected.is_empty() {
        return 0.0;
    }
    let hits = selected
        .iter()
        .filter(|l| rec.occasions_list.contains(l))
        .count();
    hits as f64 / selected.len() as f64 * 100.0
}

/// Share of selected broad-mood labels that some record mood label contains, ×100.
pub fn mood_ratio(selected: &[String], rec: &VideoRecord) -> f64 {
    if selected.is_empty() {
        return 0.0;
    }
    let hits = selected
        .iter()
        .filter(|l| rec.moods_list.iter().any(|m| m.contains(l.as_str())))
        .count();
    hits as f64 / selected.len() as f64 * 100.0
}

/// +1500 per satisfied group (each constraint, plus the style include list), counted once
/// per group however many synonyms hit; +100 when the record is a style hard id.
pub fn constraint_bonus(
    constraints: &[&ConstraintRule],
    style: Option<&StyleRule>,
    rec: &VideoRecord,
) -> f64 {
    let mut bonus = constraints
        .iter()
        .filter(|c| c.matches(rec))
        .count() as f64
        * GROUP_BONUS;
    if let Some(s) = style {
        if s.text_hit(&rec.normalized_text) {
            bonus += GROUP_BONUS;
        }
        if s.is_hard_id(rec.id) {
            bonus += HARD_ID_BONUS;
        }
    }
    bonus
}

/// Everything the row scorers need, resolved once per request.
#[derive(Debug, Clone)]
pub struct Scorer<'r> {
    tones: &'r ToneTable,
    requested_tone: Option<String>,
    ignore_tone: bool,
    occasion_labels: Vec<String>,
    mood_labels: Vec<String>,
    constraints: Vec<&'r ConstraintRule>,
    style: Option<&'r StyleRule>,
    now: DateTime<Utc>,
}

impl<'r> Scorer<'r> {
    pub fn new(
        registry: &'r Registry,
        ctx: &FilterContext,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigurationError> {
        let mood_labels = match ctx.mood_group() {
            Some(key) => registry.mood_groups().require(key)?.labels.clone(),
            None => Vec::new(),
        };
        let constraints = ctx
            .constraints()
            .iter()
            .map(|t| registry.constraints().require(t))
            .collect::<Result<Vec<_>, _>>()?;
        let style = ctx
            .style()
            .map(|t| registry.styles().require(t))
            .transpose()?;

        Ok(Self {
            tones: registry.tones(),
            requested_tone: ctx.tone().map(str::to_string),
            ignore_tone: ctx.ignore_tone(),
            occasion_labels: selected_occasion_labels(registry, ctx)?,
            mood_labels,
            constraints,
            style,
            now,
        })
    }

    pub fn occasion_labels(&self) -> &[String] {
        &self.occasion_labels
    }

    pub fn score(&self, rec: &VideoRecord) -> ScoreBreakdown {
        ScoreBreakdown {
            tpo: tpo_ratio(&self.occasion_labels, rec),
            mood: mood_ratio(&self.mood_labels, rec),
            tone: self
                .tones
                .score(self.requested_tone.as_deref(), &rec.tone, self.ignore_tone),
            quality: quality_score(rec, self.now),
            bonus: constraint_bonus(&self.constraints, self.style, rec),
        }
    }
}

/// Occasion group ∪ labels of every selected occasion detail tag; case-folded,
/// deduplicated, group first.
pub fn selected_occasion_labels(
    registry: &Registry,
    ctx: &FilterContext,
) -> Result<Vec<String>, ConfigurationError> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |l: String| {
        if !l.is_empty() && !out.contains(&l) {
            out.push(l);
        }
    };
    if let Some(g) = ctx.occasion_group() {
        push(g.trim().to_lowercase());
    }
    for tag in ctx.occasion_details() {
        for l in registry.occasion_tags().require(tag)?.labels() {
            push(l.clone());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{preprocess, RawCount, RawVideoRecord};
    use chrono::TimeZone;

    fn rec(title: &str, moods: &str, occasions: &str, views: u64, likes: u64) -> VideoRecord {
        preprocess(vec![RawVideoRecord {
            id: Some(RawCount::Int(1)),
            title: Some(title.into()),
            moods: Some(moods.into()),
            occasions: Some(occasions.into()),
            views: Some(RawCount::Int(views)),
            likes: Some(RawCount::Int(likes)),
            published_at: Some("2024-01-01".into()),
            ..Default::default()
        }])
        .records()[0]
            .clone()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn recency_decay_and_clamp() {
        let n = now();
        assert_eq!(recency(None, n), 0.0);
        assert_eq!(recency(Some(n), n), 1.0);
        // future dates clamp to 0 days
        assert_eq!(recency(Some(n + chrono::Duration::days(30)), n), 1.0);
        let two_years = n - chrono::Duration::days(730);
        assert!((recency(Some(two_years), n) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn quality_formula() {
        let r = rec("", "", "", 0, 0);
        // no engagement: only the recency term remains
        let expected = recency(r.published_at, now()) * 0.3 * 10.0;
        assert!((quality_score(&r, now()) - expected).abs() < 1e-9);

        let popular = rec("", "", "", 1_000_000, 50_000);
        assert!(quality_score(&popular, now()) > quality_score(&r, now()));
    }

    #[test]
    fn ratios() {
        let r = rec("", "청순 메이크업, 러블리", "격식있는, 데이트", 0, 0);
        let occ = vec!["격식있는".to_string(), "파티".to_string()];
        assert_eq!(tpo_ratio(&occ, &r), 50.0);
        assert_eq!(tpo_ratio(&[], &r), 0.0);
        let moods = vec!["청순".to_string(), "러블리".to_string()];
        assert_eq!(mood_ratio(&moods, &r), 100.0);
        assert_eq!(mood_ratio(&["시크".to_string()], &r), 0.0);
    }

    #[test]
    fn bonus_counts_each_group_once() {
        let reg = Registry::builtin().unwrap();
        let nofound = reg.constraints().get("#노파데").unwrap();
        let r = rec("노파데 파데프리 no foundation 메이크업", "", "", 0, 0);
        // three synonyms hit, still one group
        assert_eq!(constraint_bonus(&[nofound], None, &r), GROUP_BONUS);

        let monolid = reg.constraints().get("#무쌍").unwrap();
        assert_eq!(constraint_bonus(&[nofound, monolid], None, &r), GROUP_BONUS);
    }

    #[test]
    fn bonus_includes_style_text_and_hard_id() {
        let reg = Registry::builtin().unwrap();
        let aespa = reg.styles().get("#에스파").unwrap();
        let mut r = rec("카리나 메이크업", "", "", 0, 0);
        assert_eq!(constraint_bonus(&[], Some(aespa), &r), GROUP_BONUS);
        r.id = 50;
        assert_eq!(
            constraint_bonus(&[], Some(aespa), &r),
            GROUP_BONUS + HARD_ID_BONUS
        );
    }

    #[test]
    fn occasion_labels_merge_group_and_details() {
        let reg = Registry::builtin().unwrap();
        let ctx = FilterContext::builder()
            .occasion_group("격식있는")
            .detail_tags(["#하객/결혼식", "#증명사진/졸사", "#벚꽃/피크닉"])
            .build(&reg)
            .unwrap();
        assert_eq!(
            selected_occasion_labels(&reg, &ctx).unwrap(),
            vec!["격식있는", "데이트"]
        );
    }
}
