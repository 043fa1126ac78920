use crate::domain::article::Article;
use crate::domain::sentiment::{SentimentLabel, SentimentResult};
use crate::sentiment::SentimentClient;

/// Mean-compound band for the overall label.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

pub const FAILED_REASONING: &str = "Sentiment analysis failed";
pub const NO_CONTENT_REASONING: &str = "No content for analysis";
pub const NO_ARTICLES_REASONING: &str = "No articles could be analyzed";

/// Articles annotated with per-item sentiment, plus the compound scores of
/// the items that actually scored (placeholders excluded).
#[derive(Debug, Clone)]
pub struct ScoredArticles {
    pub articles: Vec<Article>,
    compounds: Vec<f64>,
}

impl ScoredArticles {
    /// Market-wide result over the successfully-scored items.
    pub fn overall(&self) -> SentimentResult {
        aggregate_compound(&self.compounds)
    }

    pub fn scored_count(&self) -> usize {
        self.compounds.len()
    }
}

/// Scores each article in input order, one scorer call at a time. A failed
/// call is logged and the article gets a Neutral placeholder; the batch never
/// aborts. Articles with no usable text skip the scorer entirely.
pub async fn score_articles(
    client: &dyn SentimentClient,
    articles: Vec<Article>,
) -> ScoredArticles {
    let mut out = Vec::with_capacity(articles.len());
    let mut compounds = Vec::with_capacity(articles.len());

    for mut article in articles {
        let result = match article.analysis_text() {
            None => SentimentResult::neutral(NO_CONTENT_REASONING),
            Some(text) => match client.analyze_text(text).await {
                Ok(result) => {
                    compounds.push(result.compound);
                    result
                }
                Err(err) => {
                    tracing::warn!(
                        title = %article.title,
                        error = %err,
                        "sentiment analysis failed for article"
                    );
                    SentimentResult::neutral(FAILED_REASONING)
                }
            },
        };

        article.sentiment = Some(result.label);
        article.reasoning = Some(result.reasoning);
        article.compound = Some(result.compound);
        out.push(article);
    }

    ScoredArticles {
        articles: out,
        compounds,
    }
}

/// Combines per-text compound scores into one market-wide result.
pub fn aggregate_compound(compounds: &[f64]) -> SentimentResult {
    if compounds.is_empty() {
        return SentimentResult::neutral(NO_ARTICLES_REASONING);
    }

    let average = compounds.iter().sum::<f64>() / compounds.len() as f64;

    let label = if average >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if average <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    let mut reasoning = format!(
        "Based on an average compound score of {average:.2} from {} articles.",
        compounds.len()
    );
    reasoning.push_str(match label {
        SentimentLabel::Positive => " The overall tone is generally positive.",
        SentimentLabel::Negative => " The overall tone is generally negative.",
        _ => " The overall tone is neutral or mixed.",
    });

    SentimentResult {
        label,
        reasoning,
        compound: average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct StubScorer;

    #[async_trait::async_trait]
    impl SentimentClient for StubScorer {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn analyze_text(&self, text: &str) -> anyhow::Result<SentimentResult> {
            if text.contains("broken") {
                anyhow::bail!("scorer unavailable");
            }
            let compound = if text.contains("soars") { 0.8 } else { -0.4 };
            Ok(SentimentResult {
                label: if compound > 0.0 {
                    SentimentLabel::Positive
                } else {
                    SentimentLabel::Negative
                },
                reasoning: "stub".to_string(),
                compound,
            })
        }
    }

    fn article(id: &str, title: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            url: id.to_string(),
            source: "Test".to_string(),
            published_at: Utc::now(),
            symbol: None,
            sentiment: None,
            reasoning: None,
            compound: None,
        }
    }

    #[test]
    fn mean_at_or_above_band_is_positive() {
        let result = aggregate_compound(&[0.8, 0.6, -0.2, -0.9, 0.05]);
        // mean = 0.07
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!((result.compound - 0.07).abs() < 1e-9);
        assert!(result.reasoning.contains("from 5 articles"));
    }

    #[test]
    fn mean_below_negative_band_is_negative() {
        let result = aggregate_compound(&[-0.3, -0.1, 0.1]);
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[test]
    fn mean_inside_band_is_neutral() {
        let result = aggregate_compound(&[0.04, -0.03]);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn empty_input_is_exactly_neutral_zero() {
        let result = aggregate_compound(&[]);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.compound, 0.0);
        assert_eq!(result.reasoning, NO_ARTICLES_REASONING);
    }

    #[tokio::test]
    async fn failed_items_get_placeholders_and_do_not_abort() {
        let articles = vec![
            article("a1", "Market soars on earnings"),
            article("a2", "broken feed item"),
            article("a3", "Bank slides after downgrade"),
        ];

        let scored = score_articles(&StubScorer, articles).await;

        assert_eq!(scored.articles.len(), 3);
        assert_eq!(scored.scored_count(), 2);

        let failed = &scored.articles[1];
        assert_eq!(failed.sentiment, Some(SentimentLabel::Neutral));
        assert_eq!(failed.reasoning.as_deref(), Some(FAILED_REASONING));
        assert_eq!(failed.compound, Some(0.0));

        // Input order is preserved.
        assert_eq!(scored.articles[0].compound, Some(0.8));
        assert_eq!(scored.articles[2].compound, Some(-0.4));

        // Overall mean uses only the two scored items: (0.8 - 0.4) / 2 = 0.2.
        let overall = scored.overall();
        assert_eq!(overall.label, SentimentLabel::Positive);
        assert!((overall.compound - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn blank_articles_skip_the_scorer() {
        let scored = score_articles(&StubScorer, vec![article("a1", "  ")]).await;
        assert_eq!(scored.scored_count(), 0);
        assert_eq!(
            scored.articles[0].reasoning.as_deref(),
            Some(NO_CONTENT_REASONING)
        );
        assert_eq!(scored.overall().reasoning, NO_ARTICLES_REASONING);
    }
}
