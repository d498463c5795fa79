//! Canonical in-memory representation of one collected user review.
//!
//! This struct is used as the standard output for all
//! [`ReviewProvider`](crate::providers::ReviewProvider) implementations,
//! regardless of which store or marketplace the review came from.

use serde::{Deserialize, Serialize};

/// A single user review for one banking application, as collected.
///
/// This struct is vendor-agnostic and flows through the whole pipeline;
/// enrichment stages wrap it rather than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    /// Externally-assigned review identifier, unique per marketplace.
    pub review_id: String,

    /// Name of the institution the reviewed app belongs to.
    pub bank: String,

    /// Raw review body as authored. May be empty.
    pub review_text: String,

    /// Star rating in [1,5]. Providers pass through whatever the source
    /// reported; missing ratings are dropped later at the cleaning stage.
    pub rating: Option<i32>,

    /// Calendar date the review was authored, formatted `%Y-%m-%d`.
    pub date: String,

    /// Provenance of the review (e.g., "Google Play Store").
    pub source: String,
}

/// One app listing to collect reviews for.
///
/// Groups the institution name with the marketplace package id and the
/// collection knobs for that listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppListing {
    /// Institution name used throughout the pipeline (e.g., "Dashen Bank").
    pub bank: String,
    /// Marketplace package id (e.g., "com.dashen.dashensuperapp").
    pub app_id: String,
    /// Review language filter.
    pub lang: String,
    /// Country code the reviews are fetched for.
    pub country: String,
    /// Maximum number of reviews to collect for this listing.
    pub count: u32,
}
