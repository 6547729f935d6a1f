// src/tone.rs
//! Personal-color tone table: coarse warm/cool grouping for the base filter and the tone score.

use serde::Serialize;

use crate::error::ConfigurationError;

pub const EXACT_TONE_SCORE: f64 = 100.0;
pub const GROUP_TONE_SCORE: f64 = 40.0;
pub const DEFAULT_UNCLASSIFIED_TONE: &str = "미분류";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneGroup {
    Warm,
    Cool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToneTable {
    warm: Vec<String>,
    cool: Vec<String>,
    unclassified: String,
}

impl ToneTable {
    pub fn new(
        warm: Vec<String>,
        cool: Vec<String>,
        unclassified: String,
    ) -> Result<Self, ConfigurationError> {
        let clean = |v: Vec<String>| -> Vec<String> {
            v.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        let warm = clean(warm);
        let cool = clean(cool);
        if warm.is_empty() || cool.is_empty() {
            return Err(ConfigurationError::InvalidToneTable(
                "warm and cool groups need at least one tone",
            ));
        }
        Ok(Self {
            warm,
            cool,
            unclassified: unclassified.trim().to_string(),
        })
    }

    /// Group of a requested tone by substring, cool checked first. Neutral or unknown → `None`.
    pub fn group_of(&self, tone: &str) -> Option<ToneGroup> {
        if self.cool.iter().any(|c| tone.contains(c.as_str())) {
            Some(ToneGroup::Cool)
        } else if self.warm.iter().any(|w| tone.contains(w.as_str())) {
            Some(ToneGroup::Warm)
        } else {
            None
        }
    }

    pub fn members(&self, group: ToneGroup) -> &[String] {
        match group {
            ToneGroup::Warm => &self.warm,
            ToneGroup::Cool => &self.cool,
        }
    }

    /// Whether a catalog tone belongs to `group` (substring of any member).
    pub fn in_group(&self, record_tone: &str, group: ToneGroup) -> bool {
        self.members(group)
            .iter()
            .any(|m| record_tone.contains(m.as_str()))
    }

    pub fn unclassified(&self) -> &str {
        &self.unclassified
    }

    pub fn is_unclassified(&self, record_tone: &str) -> bool {
        let t = record_tone.trim();
        t.is_empty() || t == self.unclassified
    }

    /// 0 when ignored or unclassified, 100 on exact match, otherwise 40.
    /// Rows from the wrong group never get here; they are filtered upstream, not penalized.
    pub fn score(&self, requested: Option<&str>, record_tone: &str, ignore_tone: bool) -> f64 {
        if ignore_tone || self.is_unclassified(record_tone) {
            return 0.0;
        }
        if requested == Some(record_tone) {
            EXACT_TONE_SCORE
        } else {
            GROUP_TONE_SCORE
        }
    }
}
