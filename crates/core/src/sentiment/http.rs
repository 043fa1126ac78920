use crate::config::Settings;
use crate::domain::sentiment::{SentimentLabel, SentimentResult};
use crate::sentiment::SentimentClient;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the external scoring service: `POST {base}/analyze` with
/// `{"text": ...}`, VADER-style response.
#[derive(Debug, Clone)]
pub struct HttpSentimentClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSentimentClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_sentiment_api_url()?.to_string();

        let timeout_secs = std::env::var("SENTIMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build sentiment http client")?;

        Ok(Self { http, base_url })
    }
}

#[async_trait::async_trait]
impl SentimentClient for HttpSentimentClient {
    fn provider_name(&self) -> &'static str {
        "vader_http"
    }

    async fn analyze_text(&self, text: &str) -> Result<SentimentResult> {
        let url = format!("{}/analyze", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .context("sentiment request failed")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("failed to read sentiment response body")?;
        if !status.is_success() {
            anyhow::bail!("sentiment service HTTP {status}: {body}");
        }

        let parsed = serde_json::from_str::<AnalyzeResponse>(&body)
            .with_context(|| format!("failed to parse sentiment response: {body}"))?;

        Ok(SentimentResult {
            label: parsed.sentiment,
            reasoning: parsed.reasoning,
            compound: parsed.scores.compound,
        })
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    sentiment: SentimentLabel,
    #[serde(default)]
    reasoning: String,
    scores: Scores,
}

#[derive(Debug, Deserialize)]
struct Scores {
    compound: f64,
}
