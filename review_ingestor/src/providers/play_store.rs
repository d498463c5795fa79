//! Play-store review provider.
//!
//! Talks to a review mirror endpoint that exposes marketplace reviews as
//! paginated JSON. The endpoint URL defaults to [`DEFAULT_BASE_URL`] and can
//! be overridden with the `REVIEW_SOURCE_URL` environment variable, which is
//! how tests point the provider at a local fixture server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared_utils::env::env_var_or;

use crate::{
    models::review::{AppListing, RawReview},
    providers::{ProviderError, ReviewProvider},
};

const DEFAULT_BASE_URL: &str = "https://reviews-mirror.gplay.dev/v1/reviews";

const SOURCE_NAME: &str = "Google Play Store";

/// One review as returned by the mirror endpoint.
#[derive(Debug, Deserialize)]
struct PlayReview {
    #[serde(rename = "reviewId")]
    review_id: String,
    content: Option<String>,
    score: Option<i32>,
    at: DateTime<Utc>,
}

/// One page of the paginated review listing.
#[derive(Debug, Deserialize)]
struct PlayPage {
    reviews: Vec<PlayReview>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

pub struct PlayStoreProvider {
    client: Client,
    base_url: String,
}

impl PlayStoreProvider {
    /// Creates a new play-store provider with a default HTTP client.
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: env_var_or("REVIEW_SOURCE_URL", DEFAULT_BASE_URL),
        })
    }

    /// Creates a provider pointed at an explicit endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ReviewProvider for PlayStoreProvider {
    async fn fetch_reviews(&self, listing: &AppListing) -> Result<Vec<RawReview>, ProviderError> {
        if listing.app_id.trim().is_empty() {
            return Err(ProviderError::Validation("empty app id".to_string()));
        }

        let mut collected: Vec<RawReview> = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut query_params = vec![
                ("app_id".to_string(), listing.app_id.clone()),
                ("lang".to_string(), listing.lang.clone()),
                ("country".to_string(), listing.country.clone()),
                ("count".to_string(), listing.count.to_string()),
            ];
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let response = self
                .client
                .get(&self.base_url)
                .query(&query_params)
                .send()
                .await?;

            if !response.status().is_success() {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                return Err(ProviderError::Api(error_msg));
            }

            let page = response.json::<PlayPage>().await?;

            for rev in page.reviews {
                collected.push(RawReview {
                    review_id: rev.review_id,
                    bank: listing.bank.clone(),
                    review_text: rev.content.unwrap_or_default(),
                    rating: rev.score,
                    date: rev.at.format("%Y-%m-%d").to_string(),
                    source: SOURCE_NAME.to_string(),
                });
            }

            // Stop once the listing quota is reached or there are no more pages.
            if collected.len() >= listing.count as usize {
                collected.truncate(listing.count as usize);
                break;
            }
            match page.next_page_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_payload_deserializes_with_token() {
        let payload = r#"{
            "reviews": [
                {
                    "reviewId": "gp:r1",
                    "content": "Great app, fast transfers!",
                    "score": 5,
                    "at": "2024-05-10T08:30:00Z"
                },
                {
                    "reviewId": "gp:r2",
                    "content": null,
                    "score": null,
                    "at": "2024-05-11T12:00:00Z"
                }
            ],
            "nextPageToken": "abc123"
        }"#;

        let page: PlayPage = serde_json::from_str(payload).unwrap();
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("abc123"));

        let first = &page.reviews[0];
        assert_eq!(first.review_id, "gp:r1");
        assert_eq!(first.score, Some(5));
        assert_eq!(first.at.format("%Y-%m-%d").to_string(), "2024-05-10");

        // Deleted reviews come back with null body and score.
        assert_eq!(page.reviews[1].content, None);
        assert_eq!(page.reviews[1].score, None);
    }

    #[test]
    fn last_page_has_no_token() {
        let page: PlayPage = serde_json::from_str(r#"{"reviews": []}"#).unwrap();
        assert!(page.reviews.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
