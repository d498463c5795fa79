//! Theme assignment stage.
//!
//! A configuration-driven classifier, not a trained model: each configured
//! theme is a named keyword group, and a review gets the theme whose keywords
//! occur most often in its cleaned text. Ties between nonzero scores go to
//! the earliest-declared group, which is why the groups are an `IndexMap`
//! and never a hash map.

use indexmap::IndexMap;
use tracing::debug;

use crate::records::{EnrichedReview, ScoredReview};

/// Reserved theme for reviews matching no configured keyword group.
pub const OTHER_THEME: &str = "Other";

/// Assigns exactly one theme to `text`.
///
/// Counts case-insensitive keyword occurrences per group; the strictly
/// highest count wins, ties resolve to the earliest-declared group, and an
/// all-zero score yields [`OTHER_THEME`]. Keywords are matched as substrings,
/// so "transfer" also hits "transfers".
pub fn assign_theme(text: &str, groups: &IndexMap<String, Vec<String>>) -> String {
    let lower = text.to_lowercase();

    let mut best: Option<(&str, usize)> = None;
    for (name, keywords) in groups {
        let hits = keywords.iter().filter(|kw| lower.contains(kw.as_str())).count();
        // Strictly-greater keeps the earliest group on ties.
        if best.map_or(true, |(_, best_hits)| hits > best_hits) {
            best = Some((name, hits));
        }
    }

    match best {
        Some((name, hits)) if hits > 0 => name.to_string(),
        _ => OTHER_THEME.to_string(),
    }
}

/// Runs the theme-assignment stage over a scored dataset.
///
/// Returns the enriched rows in input order plus the number of reviews that
/// fell through to [`OTHER_THEME`].
pub fn apply_themes(
    rows: Vec<ScoredReview>,
    groups: &IndexMap<String, Vec<String>>,
) -> (Vec<EnrichedReview>, usize) {
    let mut enriched = Vec::with_capacity(rows.len());
    let mut unthemed = 0usize;

    for row in rows {
        let theme = assign_theme(&row.cleaned_text, groups);
        if theme == OTHER_THEME {
            unthemed += 1;
        }
        enriched.push(EnrichedReview::from_scored(row, theme));
    }

    debug!(total = enriched.len(), unthemed, "theme assignment finished");
    (enriched, unthemed)
}
