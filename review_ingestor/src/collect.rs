//! Batch collection across app listings.
//!
//! Collection may partially fail per institution: a listing that errors or
//! times out is recorded as a [`CollectFailure`] and the batch continues with
//! degraded coverage. Only the caller decides whether an empty result is
//! fatal.

use std::time::Duration;

use tokio::time::timeout;

use crate::{
    models::review::{AppListing, RawReview},
    providers::ReviewProvider,
};

/// A listing that could not be collected, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectFailure {
    /// Institution whose listing failed.
    pub bank: String,
    /// Human-readable failure reason (timeout, API error, ...).
    pub reason: String,
}

/// Result of collecting a whole batch of listings.
#[derive(Debug, Default)]
pub struct Collected {
    /// Reviews from every listing that succeeded, in listing order.
    pub reviews: Vec<RawReview>,
    /// Listings that failed, in listing order.
    pub failures: Vec<CollectFailure>,
}

/// Fetches reviews for every listing, bounding each fetch by `per_listing_timeout`.
///
/// A timed-out or failed listing never aborts the batch; it is recorded in
/// [`Collected::failures`] and the remaining listings are still fetched.
pub async fn collect_reviews(
    provider: &dyn ReviewProvider,
    listings: &[AppListing],
    per_listing_timeout: Duration,
) -> Collected {
    let mut out = Collected::default();

    for listing in listings {
        match timeout(per_listing_timeout, provider.fetch_reviews(listing)).await {
            Ok(Ok(mut reviews)) => out.reviews.append(&mut reviews),
            Ok(Err(e)) => out.failures.push(CollectFailure {
                bank: listing.bank.clone(),
                reason: e.to_string(),
            }),
            Err(_) => out.failures.push(CollectFailure {
                bank: listing.bank.clone(),
                reason: format!(
                    "timed out after {}ms",
                    per_listing_timeout.as_millis()
                ),
            }),
        }
    }

    out
}
