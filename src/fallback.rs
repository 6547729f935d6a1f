// src/fallback.rs
//! Two-track tiered fallback. A request is compiled into a `TierPlan`: an ordered list of
//! tiers, each narrowing the track's base set one step further and carrying the status it
//! reports. The walk stops at the first non-empty tier; the last tier is terminal.

use serde::Serialize;

use crate::catalog::CatalogSnapshot;
use crate::context::FilterContext;
use crate::error::ConfigurationError;
use crate::filter::Candidates;
use crate::taxonomy::{Registry, StyleRule, TagRule};

const EMPTY_CATALOG_MESSAGE: &str = "아직 추천할 수 있는 영상이 없어요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// A wannabe-style tag was selected: the star outranks the situation.
    Star,
    /// Situation first, then mood.
    Mood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    StyleAndContext,
    StyleOnly,
    ContextAndMoodDetail,
    ContextAndMoodBroad,
    ContextOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStatus {
    Success,
    TpoDropped,
    MoodDetailDropped,
    MoodBroadDropped,
    MoodAllDropped,
}

impl FallbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStatus::Success => "success",
            FallbackStatus::TpoDropped => "tpo_dropped",
            FallbackStatus::MoodDetailDropped => "mood_detail_dropped",
            FallbackStatus::MoodBroadDropped => "mood_broad_dropped",
            FallbackStatus::MoodAllDropped => "mood_all_dropped",
        }
    }
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Star => "star",
            Track::Mood => "mood",
        }
    }
}

/// How much of the request was relaxed, and which tier produced the rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagInfo {
    pub status: FallbackStatus,
    pub message: String,
    pub track: Track,
    pub tier: Tier,
}

/// Extra narrowing a tier applies on top of its track's base set.
#[derive(Debug, Clone)]
enum Narrow<'r> {
    Nothing,
    OccasionAny(Vec<String>),
    Rule(&'r TagRule),
    MoodAny(&'r [String]),
}

impl<'r> Narrow<'r> {
    fn apply<'a>(&self, base: &Candidates<'a>) -> Candidates<'a> {
        match self {
            Narrow::Nothing => base.clone(),
            Narrow::OccasionAny(labels) => base.occasion_any(labels),
            Narrow::Rule(rule) => base.apply_rule(rule),
            Narrow::MoodAny(labels) => base.mood_contains_any(labels),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TierStep<'r> {
    pub tier: Tier,
    pub status: FallbackStatus,
    pub message: String,
    narrow: Narrow<'r>,
}

#[derive(Debug, Clone)]
pub struct TierPlan<'r> {
    track: Track,
    base: Base<'r>,
    steps: Vec<TierStep<'r>>,
}

/// Track base filter (tone is applied before either).
#[derive(Debug, Clone)]
enum Base<'r> {
    Star(&'r StyleRule),
    Mood {
        occasion_group: Option<String>,
        occasion_rules: Vec<&'r TagRule>,
    },
}

impl<'r> TierPlan<'r> {
    /// `occasion_labels` is the selected occasion label set (group ∪ detail labels).
    pub fn build(
        registry: &'r Registry,
        ctx: &FilterContext,
        occasion_labels: &[String],
    ) -> Result<Self, ConfigurationError> {
        let first_label = occasion_labels.first().map(String::as_str);

        if let Some(style_tag) = ctx.style() {
            let style = registry.styles().require(style_tag)?;
            let steps = if occasion_labels.is_empty() {
                vec![TierStep {
                    tier: Tier::StyleOnly,
                    status: FallbackStatus::Success,
                    message: format!("'{style_tag}' 스타일을 기준으로 추천했어요."),
                    narrow: Narrow::Nothing,
                }]
            } else {
                vec![
                    TierStep {
                        tier: Tier::StyleAndContext,
                        status: FallbackStatus::Success,
                        message: "선택하신 스타일과 상황을 모두 반영한 결과예요.".to_string(),
                        narrow: Narrow::OccasionAny(occasion_labels.to_vec()),
                    },
                    TierStep {
                        tier: Tier::StyleOnly,
                        status: FallbackStatus::TpoDropped,
                        message: format!(
                            "'{style_tag}' 스타일의 상황별 영상은 부족해서, 분위기가 가장 잘 맞는 추천을 가져왔어요."
                        ),
                        narrow: Narrow::Nothing,
                    },
                ]
            };
            return Ok(Self {
                track: Track::Star,
                base: Base::Star(style),
                steps,
            });
        }

        let occasion_rules = ctx
            .occasion_details()
            .map(|t| registry.occasion_tags().require(t))
            .collect::<Result<Vec<_>, _>>()?;
        let broad = ctx
            .mood_group()
            .map(|k| registry.mood_groups().require(k))
            .transpose()?;
        let mood_detail = ctx
            .mood_details()
            .next()
            .map(|t| registry.mood_tags().require(t).map(|r| (t, r)))
            .transpose()?;

        let context_only = |status, message: String| TierStep {
            tier: Tier::ContextOnly,
            status,
            message,
            narrow: Narrow::Nothing,
        };
        let with_broad = |status, message: String, labels: &'r [String]| TierStep {
            tier: Tier::ContextAndMoodBroad,
            status,
            message,
            narrow: Narrow::MoodAny(labels),
        };

        let mut steps = Vec::with_capacity(3);
        match (mood_detail, broad) {
            (Some((tag, rule)), broad) => {
                steps.push(TierStep {
                    tier: Tier::ContextAndMoodDetail,
                    status: FallbackStatus::Success,
                    message: "선택하신 상황과 무드를 모두 고려한 추천이에요.".to_string(),
                    narrow: Narrow::Rule(rule),
                });
                match broad {
                    Some(group) => {
                        steps.push(with_broad(
                            FallbackStatus::MoodDetailDropped,
                            format!(
                                "'{tag}' 느낌과 완전히 일치하는 영상은 없었지만, 가장 비슷한 분위기의 추천을 준비했어요."
                            ),
                            &group.labels,
                        ));
                        steps.push(context_only(
                            FallbackStatus::MoodAllDropped,
                            match first_label {
                                Some(l) => format!(
                                    "선택하신 분위기와 정확히 일치하지는 않지만, '{l}' 상황에 가장 잘 어울리는 추천이에요."
                                ),
                                None => "선택하신 분위기와 정확히 일치하지는 않지만, 가장 잘 어울리는 추천이에요.".to_string(),
                            },
                        ));
                    }
                    None => steps.push(context_only(
                        FallbackStatus::MoodAllDropped,
                        "선택하신 분위기와는 다를 수 있지만, 상황에 맞는 스타일 중심으로 추천했어요."
                            .to_string(),
                    )),
                }
            }
            (None, Some(group)) => {
                steps.push(with_broad(
                    FallbackStatus::Success,
                    "선택하신 상황과 분위기를 모두 고려한 추천이에요.".to_string(),
                    &group.labels,
                ));
                steps.push(context_only(
                    FallbackStatus::MoodBroadDropped,
                    match first_label {
                        Some(l) => format!(
                            "조건에 완전히 맞는 영상은 없었지만, 가장 자연스럽게 어울릴 수 있는 '{l}' 스타일을 기준으로 추천했어요."
                        ),
                        None => "조건에 완전히 맞는 영상은 없었지만, 가장 자연스럽게 어울릴 수 있는 스타일을 기준으로 추천했어요.".to_string(),
                    },
                ));
            }
            (None, None) => steps.push(context_only(
                FallbackStatus::Success,
                "선택하신 조건에 맞춘 추천이에요.".to_string(),
            )),
        }

        Ok(Self {
            track: Track::Mood,
            base: Base::Mood {
                occasion_group: ctx.occasion_group().map(str::to_string),
                occasion_rules,
            },
            steps,
        })
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn steps(&self) -> &[TierStep<'r>] {
        &self.steps
    }

    /// Narrow the tone-filtered set to this track's base.
    fn base_set<'a>(&self, toned: &Candidates<'a>) -> Candidates<'a> {
        match &self.base {
            Base::Star(style) => toned.style(style),
            Base::Mood {
                occasion_group,
                occasion_rules,
            } => {
                let mut set = match occasion_group {
                    Some(g) => toned.occasion_contains(g),
                    None => toned.clone(),
                };
                for rule in occasion_rules {
                    set = set.apply_rule(rule);
                }
                set
            }
        }
    }

    /// Walk the tiers over the tone-filtered set.
    pub fn run<'a>(&self, toned: &Candidates<'a>) -> (Candidates<'a>, FlagInfo) {
        let flag = |step: &TierStep<'_>, message: String| FlagInfo {
            status: step.status,
            message,
            track: self.track,
            tier: step.tier,
        };

        // build() always emits at least one tier
        let Some((last, rest)) = self.steps.split_last() else {
            let flag = FlagInfo {
                status: FallbackStatus::Success,
                message: EMPTY_CATALOG_MESSAGE.to_string(),
                track: self.track,
                tier: Tier::ContextOnly,
            };
            return (toned.retain_where(|_| false), flag);
        };

        if toned.catalog().is_empty() {
            let first = rest.first().unwrap_or(last);
            return (toned.clone(), flag(first, EMPTY_CATALOG_MESSAGE.to_string()));
        }

        let base = self.base_set(toned);
        for step in rest {
            let set = step.narrow.apply(&base);
            self.trace(step, &set);
            if !set.is_empty() {
                return (set, flag(step, step.message.clone()));
            }
        }
        let set = last.narrow.apply(&base);
        self.trace(last, &set);
        (set, flag(last, last.message.clone()))
    }

    fn trace(&self, step: &TierStep<'_>, set: &Candidates<'_>) {
        tracing::debug!(
            target: "fallback",
            track = self.track.as_str(),
            tier = ?step.tier,
            status = step.status.as_str(),
            rows = set.len(),
            "tier evaluated"
        );
    }
}

/// Tone-group narrowing shared by both tracks and the availability resolver.
pub fn tone_filtered<'a>(
    registry: &Registry,
    ctx: &FilterContext,
    catalog: &'a CatalogSnapshot,
) -> Candidates<'a> {
    let all = Candidates::all(catalog);
    if ctx.ignore_tone() {
        return all;
    }
    match ctx.tone().and_then(|t| registry.tones().group_of(t)) {
        Some(group) => all.tone_group(registry.tones(), group),
        None => all,
    }
}
