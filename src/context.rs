// src/context.rs
//! Request value object. Only constructible through the validating builder, so every
//! tag it carries is known to the registry it was built against.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, RuleTable};
use crate::taxonomy::{DetailKind, Registry};

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailTag {
    pub tag: String,
    pub kind: DetailKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterContext {
    tone: Option<String>,
    occasion_group: Option<String>,
    mood_group: Option<String>,
    detail_tags: Vec<DetailTag>,
    constraints: Vec<String>,
    style: Option<String>,
    ignore_tone: bool,
    top_k: usize,
}

impl FilterContext {
    pub fn builder() -> FilterContextBuilder {
        FilterContextBuilder::default()
    }

    pub fn tone(&self) -> Option<&str> {
        self.tone.as_deref()
    }

    /// Free-form catalog occasion label (e.g. "격식있는"), matched by substring.
    pub fn occasion_group(&self) -> Option<&str> {
        self.occasion_group.as_deref()
    }

    pub fn mood_group(&self) -> Option<&str> {
        self.mood_group.as_deref()
    }

    pub fn detail_tags(&self) -> &[DetailTag] {
        &self.detail_tags
    }

    pub fn occasion_details(&self) -> impl Iterator<Item = &str> {
        self.details_of(DetailKind::Occasion)
    }

    pub fn mood_details(&self) -> impl Iterator<Item = &str> {
        self.details_of(DetailKind::Mood)
    }

    fn details_of(&self, kind: DetailKind) -> impl Iterator<Item = &str> {
        self.detail_tags
            .iter()
            .filter(move |d| d.kind == kind)
            .map(|d| d.tag.as_str())
    }

    pub fn has_occasion_detail(&self) -> bool {
        self.occasion_details().next().is_some()
    }

    pub fn has_mood_detail(&self) -> bool {
        self.mood_details().next().is_some()
    }

    pub fn constraints(&self) -> &[String] {
        &self.constraints
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn ignore_tone(&self) -> bool {
        self.ignore_tone
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterContextBuilder {
    tone: Option<String>,
    occasion_group: Option<String>,
    mood_group: Option<String>,
    detail_tags: Vec<String>,
    constraints: Vec<String>,
    style: Option<String>,
    ignore_tone: bool,
    top_k: Option<usize>,
}

impl FilterContextBuilder {
    pub fn tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn occasion_group(mut self, group: impl Into<String>) -> Self {
        self.occasion_group = Some(group.into());
        self
    }

    pub fn mood_group(mut self, key: impl Into<String>) -> Self {
        self.mood_group = Some(key.into());
        self
    }

    pub fn detail_tag(mut self, tag: impl Into<String>) -> Self {
        self.detail_tags.push(tag.into());
        self
    }

    pub fn detail_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detail_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn constraint(mut self, tag: impl Into<String>) -> Self {
        self.constraints.push(tag.into());
        self
    }

    pub fn constraints<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn style(mut self, tag: impl Into<String>) -> Self {
        self.style = Some(tag.into());
        self
    }

    pub fn ignore_tone(mut self, ignore: bool) -> Self {
        self.ignore_tone = ignore;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Fails fast on any tag the registry does not know; never degrades into an
    /// unfiltered query.
    pub fn build(self, registry: &Registry) -> Result<FilterContext, ConfigurationError> {
        let top_k = self.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(ConfigurationError::InvalidTopK(top_k));
        }

        let mood_group = non_blank(self.mood_group);
        if let Some(key) = &mood_group {
            registry.mood_groups().require(key)?;
        }

        let style = non_blank(self.style);
        if let Some(tag) = &style {
            registry.styles().require(tag)?;
        }

        let mut detail_tags: Vec<DetailTag> = Vec::with_capacity(self.detail_tags.len());
        for raw in self.detail_tags {
            let tag = raw.trim().to_string();
            if tag.is_empty() || detail_tags.iter().any(|d| d.tag == tag) {
                continue;
            }
            let kind = registry
                .detail_kind(&tag)
                .ok_or_else(|| ConfigurationError::UnknownTag {
                    table: RuleTable::Detail,
                    tag: tag.clone(),
                })?;
            detail_tags.push(DetailTag { tag, kind });
        }

        Ok(FilterContext {
            tone: non_blank(self.tone),
            occasion_group: non_blank(self.occasion_group),
            mood_group,
            detail_tags,
            constraints: validate_constraints(registry, self.constraints)?,
            style,
            ignore_tone: self.ignore_tone,
            top_k,
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Known, deduplicated, selection order kept.
fn validate_constraints(
    registry: &Registry,
    tags: impl IntoIterator<Item = String>,
) -> Result<Vec<String>, ConfigurationError> {
    let mut out: Vec<String> = Vec::new();
    for raw in tags {
        let tag = raw.trim().to_string();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        registry.constraints().require(&tag)?;
        out.push(tag);
    }
    Ok(out)
}

/// Wire form of a request context (HTTP bodies, fixtures).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextFields {
    pub tone: Option<String>,
    pub occasion_group: Option<String>,
    pub mood_group: Option<String>,
    pub detail_tags: Vec<String>,
    pub constraints: Vec<String>,
    pub style: Option<String>,
    pub ignore_tone: bool,
    pub top_k: Option<usize>,
}

impl ContextFields {
    pub fn into_context(self, registry: &Registry) -> Result<FilterContext, ConfigurationError> {
        let mut b = FilterContext::builder()
            .detail_tags(self.detail_tags)
            .constraints(self.constraints)
            .ignore_tone(self.ignore_tone);
        if let Some(t) = self.tone {
            b = b.tone(t);
        }
        if let Some(o) = self.occasion_group {
            b = b.occasion_group(o);
        }
        if let Some(m) = self.mood_group {
            b = b.mood_group(m);
        }
        if let Some(s) = self.style {
            b = b.style(s);
        }
        if let Some(k) = self.top_k {
            b = b.top_k(k);
        }
        b.build(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> Registry {
        Registry::builtin().unwrap()
    }

    #[test]
    fn classifies_detail_tags_and_defaults_k() {
        let ctx = FilterContext::builder()
            .tone("봄웜")
            .occasion_group("격식있는")
            .detail_tags(["#하객/결혼식", "#도우인", "#하객/결혼식"])
            .build(&reg())
            .unwrap();
        assert_eq!(ctx.top_k(), DEFAULT_TOP_K);
        assert_eq!(ctx.detail_tags().len(), 2);
        assert_eq!(ctx.occasion_details().collect::<Vec<_>>(), vec!["#하객/결혼식"]);
        assert_eq!(ctx.mood_details().collect::<Vec<_>>(), vec!["#도우인"]);
    }

    #[test]
    fn unknown_tags_fail_fast() {
        let r = reg();
        let err = FilterContext::builder()
            .detail_tag("#없음")
            .build(&r)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownTag {
                table: RuleTable::Detail,
                ..
            }
        ));
        assert!(FilterContext::builder().constraint("#노마스카라").build(&r).is_err());
        assert!(FilterContext::builder().style("#아무개").build(&r).is_err());
        assert!(FilterContext::builder().mood_group("group_x").build(&r).is_err());
    }

    #[test]
    fn zero_k_is_rejected() {
        let err = FilterContext::builder().top_k(0).build(&reg()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidTopK(0)));
    }

    #[test]
    fn blank_fields_are_absent() {
        let ctx = FilterContext::builder()
            .tone("  ")
            .occasion_group("")
            .style(" ")
            .build(&reg())
            .unwrap();
        assert!(ctx.tone().is_none());
        assert!(ctx.occasion_group().is_none());
        assert!(ctx.style().is_none());
    }

    #[test]
    fn wire_fields_round_into_context() {
        let fields: ContextFields = serde_json::from_value(serde_json::json!({
            "tone": "여쿨",
            "mood_group": "group_chic",
            "constraints": ["#무쌍"],
            "top_k": 3
        }))
        .unwrap();
        let ctx = fields.into_context(&reg()).unwrap();
        assert_eq!(ctx.mood_group(), Some("group_chic"));
        assert_eq!(ctx.constraints(), ["#무쌍".to_string()]);
        assert_eq!(ctx.top_k(), 3);
        assert!(!ctx.ignore_tone());
    }
}
