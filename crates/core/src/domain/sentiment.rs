use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Error,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Outcome of scoring one text, or of aggregating a batch of scores.
///
/// Aggregation always produces a fresh value; per-article results are never
/// merged in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    pub reasoning: String,
    /// Polarity/strength summary in [-1, 1].
    pub compound: f64,
}

impl SentimentResult {
    pub fn neutral(reasoning: &str) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            reasoning: reasoning.to_string(),
            compound: 0.0,
        }
    }
}
