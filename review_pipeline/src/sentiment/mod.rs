//! Sentiment classification stage.
//!
//! The classification capability itself is pluggable: anything implementing
//! [`SentimentModel`] can be used (a local lexicon, a remote inference
//! endpoint, a deterministic stub in tests). The [`SentimentAnalyzer`]
//! wrapper owns the operational policy around the model: input truncation,
//! a per-record timeout, and the fixed `(NEUTRAL, 0.5)` fallback when the
//! model fails. Model failures never abort the batch; they are counted and
//! surfaced in the run report.

pub mod lexicon;

use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::ClassifyCfg,
    records::{CleanReview, ScoredReview},
};

/// Coarse polarity of a review text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    /// The text reads as praise.
    #[serde(rename = "POSITIVE")]
    Positive,
    /// The text reads as a complaint.
    #[serde(rename = "NEGATIVE")]
    Negative,
    /// Neither, or the model could not decide.
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE" => Ok(SentimentLabel::Positive),
            "NEGATIVE" => Ok(SentimentLabel::Negative),
            "NEUTRAL" => Ok(SentimentLabel::Neutral),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

/// Errors a [`SentimentModel`] implementation can surface.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The underlying model produced an error or malformed output.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model backend could not be reached.
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// The pluggable classification capability: text in, `(label, score)` out.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Classifies `text`, returning a label and a confidence in `[0,1]`.
    async fn classify(&self, text: &str) -> Result<(SentimentLabel, f64), ModelError>;
}

/// One classification result, with a marker for whether the fallback fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// The assigned label.
    pub label: SentimentLabel,
    /// Confidence in `[0,1]`.
    pub score: f64,
    /// True when the model failed and the fixed fallback was substituted.
    pub fell_back: bool,
}

/// Wraps a [`SentimentModel`] with truncation, timeout, and fallback policy.
pub struct SentimentAnalyzer {
    model: Box<dyn SentimentModel>,
    truncate_bytes: usize,
    per_record_timeout: Duration,
}

impl SentimentAnalyzer {
    /// Creates an analyzer around `model` with the configured bounds.
    pub fn new(model: Box<dyn SentimentModel>, cfg: &ClassifyCfg) -> Self {
        Self {
            model,
            truncate_bytes: cfg.truncate_bytes,
            per_record_timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }

    /// Classifies one text. Never fails: any model error or timeout yields
    /// exactly `(NEUTRAL, 0.5)` with `fell_back` set.
    pub async fn classify(&self, text: &str) -> Classification {
        let bounded = truncate_to_boundary(text, self.truncate_bytes);

        let result = timeout(self.per_record_timeout, self.model.classify(bounded)).await;
        match result {
            Ok(Ok((label, score))) => Classification {
                label,
                score: score.clamp(0.0, 1.0),
                fell_back: false,
            },
            Ok(Err(e)) => {
                warn!(error = %e, "sentiment model failed, using neutral fallback");
                fallback()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.per_record_timeout.as_millis() as u64,
                    "sentiment model timed out, using neutral fallback"
                );
                fallback()
            }
        }
    }

    /// Runs the classification stage over a cleaned dataset.
    ///
    /// Returns the scored rows in input order plus the number of records for
    /// which the fallback fired.
    pub async fn score_reviews(&self, rows: Vec<CleanReview>) -> (Vec<ScoredReview>, usize) {
        let mut scored = Vec::with_capacity(rows.len());
        let mut fallbacks = 0usize;

        for row in rows {
            let c = self.classify(&row.cleaned_text).await;
            if c.fell_back {
                fallbacks += 1;
            }
            scored.push(ScoredReview::from_clean(row, c.label.to_string(), c.score));
        }

        (scored, fallbacks)
    }
}

fn fallback() -> Classification {
    Classification {
        label: SentimentLabel::Neutral,
        score: 0.5,
        fell_back: true,
    }
}

/// Truncates `text` to at most `max_bytes`, never splitting a character.
fn truncate_to_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
