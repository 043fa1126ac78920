pub mod aggregate;
pub mod http;

use crate::domain::sentiment::SentimentResult;

#[async_trait::async_trait]
pub trait SentimentClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Scores one text. At most one call is in flight per text; batching is
    /// the aggregator's job.
    async fn analyze_text(&self, text: &str) -> anyhow::Result<SentimentResult>;
}
