use crate::domain::sentiment::SentimentLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article as surfaced to clients and digests.
///
/// The fetch step fills the identity fields; the matcher sets `symbol`, the
/// scoring step sets `sentiment`/`reasoning`/`compound`. Once set, a field is
/// never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique identifier; the article URL.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    /// Source name (e.g. "Moneycontrol").
    pub source: String,
    pub published_at: DateTime<Utc>,

    /// First matching portfolio ticker, set by the symbol matcher.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<f64>,
}

impl Article {
    /// Text the sentiment scorer sees: title when non-empty, else description.
    pub fn analysis_text(&self) -> Option<&str> {
        if !self.title.trim().is_empty() {
            return Some(self.title.as_str());
        }
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Text the symbol matcher searches: title and description concatenated.
    pub fn match_text(&self) -> String {
        match &self.description {
            Some(d) => format!("{} {}", self.title, d),
            None => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: Option<&str>) -> Article {
        Article {
            id: "https://example.com/a".to_string(),
            title: title.to_string(),
            description: description.map(|s| s.to_string()),
            url: "https://example.com/a".to_string(),
            source: "Test".to_string(),
            published_at: Utc::now(),
            symbol: None,
            sentiment: None,
            reasoning: None,
            compound: None,
        }
    }

    #[test]
    fn analysis_text_prefers_title() {
        let a = article("Reliance soars", Some("details"));
        assert_eq!(a.analysis_text(), Some("Reliance soars"));
    }

    #[test]
    fn analysis_text_falls_back_to_description() {
        let a = article("", Some("TCS inks deal"));
        assert_eq!(a.analysis_text(), Some("TCS inks deal"));
    }

    #[test]
    fn analysis_text_none_when_blank() {
        let a = article("", Some("  "));
        assert_eq!(a.analysis_text(), None);
        let b = article("", None);
        assert_eq!(b.analysis_text(), None);
    }
}
