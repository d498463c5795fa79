//! Deterministic lexicon-based sentiment model.
//!
//! Counts positive and negative cue words in the (already normalized) text
//! and derives a label from the margin between the two counts. No state, no
//! network, same input always yields the same output, which also makes it
//! the stub of choice for tests.

use async_trait::async_trait;

use crate::sentiment::{ModelError, SentimentLabel, SentimentModel};

const POSITIVE_CUES: &[&str] = &[
    "good", "great", "excellent", "love", "best", "amazing", "easy", "nice", "helpful",
    "reliable", "smooth", "perfect", "thank",
];

const NEGATIVE_CUES: &[&str] = &[
    "bad", "worst", "crash", "problem", "error", "fail", "slow", "terrible", "useless",
    "broken", "annoying", "stuck", "wrong", "poor",
];

/// Lexicon-backed implementation of [`SentimentModel`].
#[derive(Debug, Default)]
pub struct LexiconModel;

impl LexiconModel {
    /// Creates the model. Holds no state.
    pub fn new() -> Self {
        Self
    }
}

fn cue_hits(text: &str, cues: &[&str]) -> usize {
    cues.iter().map(|cue| text.matches(cue).count()).sum()
}

#[async_trait]
impl SentimentModel for LexiconModel {
    async fn classify(&self, text: &str) -> Result<(SentimentLabel, f64), ModelError> {
        let lower = text.to_lowercase();
        let pos = cue_hits(&lower, POSITIVE_CUES);
        let neg = cue_hits(&lower, NEGATIVE_CUES);

        if pos == neg {
            return Ok((SentimentLabel::Neutral, 0.5));
        }

        let total = (pos + neg) as f64;
        let margin = (pos.abs_diff(neg)) as f64 / total;
        // Map the margin into (0.5, 0.95]: a unanimous text scores highest.
        let score = 0.5 + 0.45 * margin;

        if pos > neg {
            Ok((SentimentLabel::Positive, score))
        } else {
            Ok((SentimentLabel::Negative, score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn praise_is_positive() {
        let (label, score) = LexiconModel::new()
            .classify("great app, easy and reliable")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Positive);
        assert!(score > 0.5 && score <= 1.0);
    }

    #[tokio::test]
    async fn complaints_are_negative() {
        let (label, _) = LexiconModel::new()
            .classify("crashes every time i login, worst update")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn no_cues_is_neutral_half() {
        let (label, score) = LexiconModel::new()
            .classify("i opened an account yesterday")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Neutral);
        assert_eq!(score, 0.5);
    }

    #[tokio::test]
    async fn mixed_text_with_equal_cues_is_neutral() {
        let (label, _) = LexiconModel::new()
            .classify("great features but slow")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Neutral);
    }

    #[tokio::test]
    async fn deterministic_across_calls() {
        let model = LexiconModel::new();
        let a = model.classify("love it, never crashes").await.unwrap();
        let b = model.classify("love it, never crashes").await.unwrap();
        assert_eq!(a, b);
    }
}
