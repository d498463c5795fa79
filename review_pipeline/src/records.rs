//! Flat review records, one type per enrichment stage.
//!
//! Each stage's output is the next stage's sole input: a [`RawReview`] becomes
//! a [`CleanReview`] at the cleaning stage, a [`ScoredReview`] once sentiment
//! is attached, and an [`EnrichedReview`] once a theme is assigned. Fields are
//! accumulated, never overwritten, and every type serializes to one flat CSV
//! row for the stage snapshots.

use review_ingestor::models::review::RawReview;
use serde::{Deserialize, Serialize};

use crate::text;

/// A review that survived the cleaning stage.
///
/// Guarantees: `review_id` is non-empty and unique within the dataset,
/// `review_text` is non-empty, `rating` is in `[1,5]`, and `cleaned_text` is
/// the normalized form of `review_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanReview {
    /// Externally-assigned unique identifier.
    pub review_id: String,
    /// Institution the review pertains to.
    pub bank: String,
    /// Raw review body as authored.
    pub review_text: String,
    /// Normalized review body, derived via [`text::normalize`].
    pub cleaned_text: String,
    /// Star rating in `[1,5]`.
    pub rating: i32,
    /// Authoring date, `%Y-%m-%d`.
    pub date: String,
    /// Provenance of the review.
    pub source: String,
}

/// A cleaned review with its sentiment classification attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReview {
    /// Externally-assigned unique identifier.
    pub review_id: String,
    /// Institution the review pertains to.
    pub bank: String,
    /// Raw review body as authored.
    pub review_text: String,
    /// Normalized review body.
    pub cleaned_text: String,
    /// Star rating in `[1,5]`.
    pub rating: i32,
    /// Authoring date, `%Y-%m-%d`.
    pub date: String,
    /// Provenance of the review.
    pub source: String,
    /// Coarse polarity label (`POSITIVE`, `NEGATIVE`, `NEUTRAL`).
    pub sentiment_label: String,
    /// Confidence associated with the label, in `[0,1]`.
    pub sentiment_score: f64,
}

/// The fully enriched review record, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReview {
    /// Externally-assigned unique identifier.
    pub review_id: String,
    /// Institution the review pertains to.
    pub bank: String,
    /// Raw review body as authored.
    pub review_text: String,
    /// Normalized review body.
    pub cleaned_text: String,
    /// Star rating in `[1,5]`.
    pub rating: i32,
    /// Authoring date, `%Y-%m-%d`.
    pub date: String,
    /// Provenance of the review.
    pub source: String,
    /// Coarse polarity label (`POSITIVE`, `NEGATIVE`, `NEUTRAL`).
    pub sentiment_label: String,
    /// Confidence associated with the label, in `[0,1]`.
    pub sentiment_score: f64,
    /// Assigned theme, or `Other` when no keyword group matched.
    pub theme: String,
}

impl ScoredReview {
    /// Attaches a sentiment classification to a cleaned review.
    pub fn from_clean(r: CleanReview, label: String, score: f64) -> Self {
        Self {
            review_id: r.review_id,
            bank: r.bank,
            review_text: r.review_text,
            cleaned_text: r.cleaned_text,
            rating: r.rating,
            date: r.date,
            source: r.source,
            sentiment_label: label,
            sentiment_score: score,
        }
    }
}

impl EnrichedReview {
    /// Attaches a theme to a scored review.
    pub fn from_scored(r: ScoredReview, theme: String) -> Self {
        Self {
            review_id: r.review_id,
            bank: r.bank,
            review_text: r.review_text,
            cleaned_text: r.cleaned_text,
            rating: r.rating,
            date: r.date,
            source: r.source,
            sentiment_label: r.sentiment_label,
            sentiment_score: r.sentiment_score,
            theme,
        }
    }
}

/// Result of the cleaning stage, with one counter per exclusion rule.
#[derive(Debug, Default)]
pub struct CleanOutcome {
    /// Reviews that survived, in input order.
    pub rows: Vec<CleanReview>,
    /// Rows dropped because their `review_id` was already seen (first wins).
    pub duplicates_dropped: usize,
    /// Rows dropped for a missing/empty id, empty text, or missing rating.
    pub missing_dropped: usize,
    /// Rows dropped because the rating was outside `[1,5]`.
    pub invalid_rating_dropped: usize,
}

/// Cleans a batch of raw reviews.
///
/// De-duplicates by `review_id` keeping the first occurrence, drops rows with
/// a missing id, text, or rating, enforces the rating bounds, and derives
/// `cleaned_text`. Excluded rows are counted, never silently discarded.
pub fn clean_reviews(raw: Vec<RawReview>) -> CleanOutcome {
    let mut out = CleanOutcome::default();
    let mut seen = std::collections::HashSet::new();

    for r in raw {
        if r.review_id.trim().is_empty() || r.review_text.trim().is_empty() {
            out.missing_dropped += 1;
            continue;
        }
        let Some(rating) = r.rating else {
            out.missing_dropped += 1;
            continue;
        };
        if !(1..=5).contains(&rating) {
            out.invalid_rating_dropped += 1;
            continue;
        }
        if !seen.insert(r.review_id.clone()) {
            out.duplicates_dropped += 1;
            continue;
        }

        let cleaned_text = text::normalize(&r.review_text);
        out.rows.push(CleanReview {
            review_id: r.review_id,
            bank: r.bank,
            review_text: r.review_text,
            cleaned_text,
            rating,
            date: r.date,
            source: r.source,
        });
    }

    out
}
