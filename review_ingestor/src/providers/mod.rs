//! Provider abstraction for review sources.
//!
//! This module defines the [`ReviewProvider`] trait, which serves as a unified
//! interface for fetching user reviews from any marketplace (e.g., Google Play,
//! the App Store, a cached export on disk).
//!
//! Each concrete provider implementation should implement [`ReviewProvider`]
//! to handle source-specific transport and mapping into [`RawReview`].
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn ReviewProvider`) so the pipeline can select the source at runtime.

pub mod errors;
pub mod play_store;

use async_trait::async_trait;

pub use errors::ProviderError;

use crate::models::review::{AppListing, RawReview};

#[async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn fetch_reviews(&self, listing: &AppListing) -> Result<Vec<RawReview>, ProviderError>;
}
