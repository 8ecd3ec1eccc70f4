// src/rank.rs
//! Candidate ranking: filter, score, pick.
//!
//! Filters, in order:
//! 1) has a URL and an accepted image mime (missing mime counts as jpeg),
//! 2) title is not a fossil / specimen photo,
//! 3) title looks like artwork.
//!
//! Score = min(width*height / area_divisor, area_cap)
//!       + phrase_bonus if the title says "life restoration".
//! Highest score wins; equal scores keep first-seen order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::classify::Vocabulary;
use crate::commons::ImageCandidate;

static ACCEPTED_MIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^image/(jpeg|png|gif|webp|svg)").expect("mime regex"));
static LIFE_RESTORATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blife restoration\b").expect("phrase regex"));

pub const DEFAULT_AREA_DIVISOR: f64 = 120_000.0;
pub const DEFAULT_AREA_CAP: f64 = 50.0;
pub const DEFAULT_PHRASE_BONUS: f64 = 15.0;

/// Tunable scoring constants.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub area_divisor: f64,
    pub area_cap: f64,
    pub phrase_bonus: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            area_divisor: DEFAULT_AREA_DIVISOR,
            area_cap: DEFAULT_AREA_CAP,
            phrase_bonus: DEFAULT_PHRASE_BONUS,
        }
    }
}

impl ScoringParams {
    /// Replace non-positive / non-finite values with defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let pick = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        Self {
            area_divisor: pick(self.area_divisor, d.area_divisor),
            area_cap: pick(self.area_cap, d.area_cap),
            phrase_bonus: if self.phrase_bonus.is_finite() {
                self.phrase_bonus
            } else {
                d.phrase_bonus
            },
        }
    }

    pub fn score(&self, c: &ImageCandidate) -> f64 {
        let mut score = (c.area() / self.area_divisor).min(self.area_cap);
        if LIFE_RESTORATION.is_match(&c.title) {
            score += self.phrase_bonus;
        }
        score
    }
}

/// A candidate that survived filtering, with its score attached.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a ImageCandidate,
    pub score: f64,
}

pub fn accepted_mime(mime: &str) -> bool {
    let m = if mime.is_empty() { "image/jpeg" } else { mime };
    ACCEPTED_MIME.is_match(m)
}

/// Surviving candidates, best first.
pub fn rank_candidates<'a>(
    cands: &'a [ImageCandidate],
    vocab: &Vocabulary,
    params: &ScoringParams,
) -> Vec<ScoredCandidate<'a>> {
    let mut scored: Vec<ScoredCandidate<'a>> = cands
        .iter()
        .filter(|c| c.url.is_some() && accepted_mime(&c.mime))
        .filter(|c| !vocab.looks_fossil_or_mount(&c.title))
        .filter(|c| vocab.looks_paleoart(&c.title))
        .map(|c| ScoredCandidate {
            candidate: c,
            score: params.score(c),
        })
        .collect();

    // sort_by is stable: ties keep input order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// URL of the best candidate, if any survives filtering.
pub fn pick_best_art(
    cands: &[ImageCandidate],
    vocab: &Vocabulary,
    params: &ScoringParams,
) -> Option<String> {
    rank_candidates(cands, vocab, params)
        .first()
        .and_then(|s| s.candidate.url.clone())
}
