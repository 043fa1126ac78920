pub mod fallback;
pub mod matcher;
pub mod newsapi;

use crate::domain::article::Article;
use anyhow::Result;

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Broad market-news query.
    async fn fetch_general(&self) -> Result<Vec<Article>>;

    /// A few recent articles for one ticker, each pre-tagged with the ticker.
    async fn fetch_for_symbol(&self, symbol: &str) -> Result<Vec<Article>>;
}
