// src/taxonomy/rules.rs
//! Compiled rule variants. Each matcher is a pure predicate over one `VideoRecord`.

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::catalog::{VideoId, VideoRecord};
use crate::error::{ConfigurationError, RuleTable};

/// Detail-tag rule (occasion or mood table).
#[derive(Debug, Clone, PartialEq)]
pub enum TagRule {
    /// Any label appears among the record's mood or occasion labels.
    Label { labels: Vec<String> },
    /// Any keyword appears in the record's normalized text.
    Text { keywords: Vec<String> },
    /// A label hit AND a keyword hit.
    Hybrid {
        labels: Vec<String>,
        keywords: Vec<String>,
    },
}

impl TagRule {
    pub fn matches(&self, rec: &VideoRecord) -> bool {
        match self {
            TagRule::Label { labels } => label_hit(labels, rec),
            TagRule::Text { keywords } => keyword_hit(keywords, &rec.normalized_text),
            TagRule::Hybrid { labels, keywords } => {
                label_hit(labels, rec) && keyword_hit(keywords, &rec.normalized_text)
            }
        }
    }

    /// Categorical labels carried by the rule (empty for text rules).
    pub fn labels(&self) -> &[String] {
        match self {
            TagRule::Label { labels } | TagRule::Hybrid { labels, .. } => labels,
            TagRule::Text { .. } => &[],
        }
    }

    pub fn keywords(&self) -> &[String] {
        match self {
            TagRule::Text { keywords } | TagRule::Hybrid { keywords, .. } => keywords,
            TagRule::Label { .. } => &[],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TagRule::Label { .. } => "label",
            TagRule::Text { .. } => "text",
            TagRule::Hybrid { .. } => "hybrid",
        }
    }
}

/// Exact label membership, or a label that is a substring of a record label
/// (older catalog rows carry decorated labels such as "청순 메이크업").
pub(crate) fn label_hit(labels: &[String], rec: &VideoRecord) -> bool {
    labels
        .iter()
        .any(|l| rec.labels().any(|r| r == l || r.contains(l.as_str())))
}

pub(crate) fn keyword_hit(keywords: &[String], normalized_text: &str) -> bool {
    keywords.iter().any(|k| normalized_text.contains(k.as_str()))
}

/// Synonym patterns for one constraint concept. Satisfied if ANY pattern matches.
#[derive(Debug, Clone)]
pub struct ConstraintRule {
    patterns: Vec<Regex>,
}

impl ConstraintRule {
    pub fn compile(tag: &str, patterns: &[String]) -> Result<Self, ConfigurationError> {
        if patterns.is_empty() {
            return Err(ConfigurationError::EmptyRule {
                table: RuleTable::Constraint,
                tag: tag.to_string(),
                reason: "no patterns",
            });
        }
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigurationError::InvalidPattern {
                        table: RuleTable::Constraint,
                        tag: tag.to_string(),
                        pattern: p.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_satisfied(&self, normalized_text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(normalized_text))
    }

    pub fn matches(&self, rec: &VideoRecord) -> bool {
        self.is_satisfied(&rec.normalized_text)
    }

    /// How many synonyms hit. Diagnostic only; the bonus is boolean per rule.
    pub fn matching_patterns(&self, normalized_text: &str) -> usize {
        self.patterns
            .iter()
            .filter(|re| re.is_match(normalized_text))
            .count()
    }
}

/// Wannabe-style reference: include keywords plus a closed list of force-included ids
/// (disambiguates a public figure from unrelated same-named entities).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    include_keywords: Vec<String>,
    hard_ids: BTreeSet<VideoId>,
}

impl StyleRule {
    pub fn new(
        tag: &str,
        include_keywords: Vec<String>,
        hard_ids: impl IntoIterator<Item = VideoId>,
    ) -> Result<Self, ConfigurationError> {
        let hard_ids: BTreeSet<VideoId> = hard_ids.into_iter().collect();
        if include_keywords.is_empty() && hard_ids.is_empty() {
            return Err(ConfigurationError::EmptyRule {
                table: RuleTable::Style,
                tag: tag.to_string(),
                reason: "no include keywords and no hard ids",
            });
        }
        Ok(Self {
            include_keywords,
            hard_ids,
        })
    }

    pub fn text_hit(&self, normalized_text: &str) -> bool {
        keyword_hit(&self.include_keywords, normalized_text)
    }

    pub fn is_hard_id(&self, id: VideoId) -> bool {
        self.hard_ids.contains(&id)
    }

    /// Text hit OR hard id.
    pub fn matches(&self, rec: &VideoRecord) -> bool {
        self.text_hit(&rec.normalized_text) || self.is_hard_id(rec.id)
    }

    pub fn include_keywords(&self) -> &[String] {
        &self.include_keywords
    }

    pub fn hard_ids(&self) -> &BTreeSet<VideoId> {
        &self.hard_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{preprocess, RawCount, RawVideoRecord};

    fn rec(id: u64, title: &str, moods: &str, occasions: &str) -> VideoRecord {
        preprocess(vec![RawVideoRecord {
            id: Some(RawCount::Int(id)),
            title: Some(title.into()),
            moods: Some(moods.into()),
            occasions: Some(occasions.into()),
            ..Default::default()
        }])
        .records()[0]
            .clone()
    }

    #[test]
    fn hybrid_requires_both_signals() {
        let rule = TagRule::Hybrid {
            labels: vec!["청순".into()],
            keywords: vec!["울먹".into()],
        };
        // label only
        assert!(!rule.matches(&rec(1, "데일리 메이크업", "청순", "")));
        // keyword only
        assert!(!rule.matches(&rec(2, "울먹 메이크업", "시크", "")));
        // both
        assert!(rule.matches(&rec(3, "울먹 메이크업", "청순", "")));
    }

    #[test]
    fn label_rule_looks_at_moods_and_occasions() {
        let rule = TagRule::Label {
            labels: vec!["데이트".into()],
        };
        assert!(rule.matches(&rec(1, "", "러블리", "데이트")));
        assert!(rule.matches(&rec(2, "", "", "첫 데이트룩")));
        assert!(!rule.matches(&rec(3, "데이트", "러블리", "파티")));
    }

    #[test]
    fn constraint_synonyms_and_bad_pattern() {
        let rule = ConstraintRule::compile(
            "#노파데",
            &[r"파데\s*프리".into(), r"노\s*파데".into(), r"no\s*foundation".into()],
        )
        .unwrap();
        assert!(rule.is_satisfied("오늘은 노 파데 메이크업"));
        assert!(rule.is_satisfied("no foundation look"));
        assert_eq!(rule.matching_patterns("파데프리 노파데"), 2);
        assert!(!rule.is_satisfied("풀커버 파운데이션"));

        let err = ConstraintRule::compile("#broken", &["(unclosed".into()]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { .. }));
    }

    #[test]
    fn style_hard_ids_force_include() {
        let style = StyleRule::new("#에스파", vec!["에스파".into()], [50]).unwrap();
        assert!(style.matches(&rec(50, "겨울 메이크업", "", "")));
        assert!(style.matches(&rec(51, "에스파 커버", "", "")));
        assert!(!style.matches(&rec(52, "겨울 메이크업", "", "")));
    }
}
