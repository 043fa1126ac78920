use crate::config::Settings;
use crate::domain::article::Article;
use crate::news::NewsProvider;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const GENERAL_QUERY: &str =
    "Indian stock market OR Sensex OR Nifty OR BSE OR NSE OR India shares";
const GENERAL_PAGE_SIZE: u32 = 20;
const SYMBOL_PAGE_SIZE: u32 = 3;

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_news_api_key()?.to_string();
        let base_url = settings
            .news_api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("NEWS_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build news api http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }

    async fn search(&self, query: &str, sort_by: &str, page_size: u32) -> Result<Vec<Article>> {
        let url = format!("{}/everything", self.base_url.trim_end_matches('/'));
        let page_size = page_size.to_string();
        let res = self
            .http
            .get(url)
            .headers(self.headers()?)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", sort_by),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("news api request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read news api response body")?;
        if !status.is_success() {
            anyhow::bail!("news api HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<SearchResponse>(&text)
            .with_context(|| format!("failed to parse news api response: {text}"))?;

        let articles: Vec<Article> = parsed
            .articles
            .into_iter()
            .filter_map(RawArticle::into_article)
            .collect();
        Ok(articles)
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_general(&self) -> Result<Vec<Article>> {
        let articles = self
            .search(GENERAL_QUERY, "publishedAt", GENERAL_PAGE_SIZE)
            .await?;
        tracing::info!(count = articles.len(), "fetched general news");
        Ok(articles)
    }

    async fn fetch_for_symbol(&self, symbol: &str) -> Result<Vec<Article>> {
        let mut articles = self.search(symbol, "relevancy", SYMBOL_PAGE_SIZE).await?;
        for article in &mut articles {
            article.symbol = Some(symbol.to_string());
        }
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// Raw NewsAPI article shape; every field may be missing or null.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: RawSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl RawArticle {
    /// Drops articles missing title, url, or timestamp.
    fn into_article(self) -> Option<Article> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let published_at = self.published_at?;

        Some(Article {
            id: url.clone(),
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            url,
            source: self.source.name.unwrap_or_else(|| "Unknown".to_string()),
            published_at,
            symbol: None,
            sentiment: None,
            reasoning: None,
            compound: None,
        })
    }
}
