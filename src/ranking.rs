// src/ranking.rs
use serde::Serialize;
use std::cmp::Ordering;

use crate::catalog::{VideoId, VideoRecord};
use crate::filter::Candidates;
use crate::scoring::{ScoreBreakdown, Scorer};

pub const TPO_WEIGHT: f64 = 0.4;
pub const MOOD_WEIGHT: f64 = 0.35;
pub const TONE_WEIGHT: f64 = 0.25;

/// One ranked row as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredVideo {
    pub id: VideoId,
    pub title: String,
    pub channel: String,
    pub url: String,
    pub final_score: f64,
    pub tone: String,
    pub moods: String,
    pub occasions: String,
    pub breakdown: ScoreBreakdown,
}

impl ScoredVideo {
    fn new(rec: &VideoRecord, breakdown: ScoreBreakdown) -> Self {
        Self {
            id: rec.id,
            title: rec.title.clone(),
            channel: rec.channel.clone(),
            url: rec.url.clone(),
            final_score: final_score(&breakdown),
            tone: rec.tone.clone(),
            moods: rec.moods.clone(),
            occasions: rec.occasions.clone(),
            breakdown,
        }
    }
}

/// Weighted relevance plus the unweighted quality and bonus terms.
pub fn final_score(b: &ScoreBreakdown) -> f64 {
    b.tpo * TPO_WEIGHT + b.mood * MOOD_WEIGHT + b.tone * TONE_WEIGHT + b.quality + b.bonus
}

/// Score every candidate, sort by score descending then id ascending, keep `k`.
pub fn rank(candidates: &Candidates<'_>, scorer: &Scorer<'_>, k: usize) -> Vec<ScoredVideo> {
    let mut scored: Vec<ScoredVideo> = candidates
        .iter()
        .map(|rec| ScoredVideo::new(rec, scorer.score(rec)))
        .collect();
    scored.sort_by(compare);
    scored.truncate(k);
    scored
}

fn compare(a: &ScoredVideo, b: &ScoredVideo) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.id.cmp(&b.id))
}
