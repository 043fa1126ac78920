pub mod digest;
pub mod domain;
pub mod email;
pub mod news;
pub mod sentiment;
pub mod storage;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub news_api_key: Option<String>,
        pub news_api_base_url: Option<String>,
        pub sentiment_api_url: Option<String>,
        pub sendgrid_api_key: Option<String>,
        pub sender_email: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                news_api_key: std::env::var("NEWS_API_KEY").ok(),
                news_api_base_url: std::env::var("NEWS_API_BASE_URL").ok(),
                sentiment_api_url: std::env::var("SENTIMENT_API_URL").ok(),
                sendgrid_api_key: std::env::var("SENDGRID_API_KEY").ok(),
                sender_email: std::env::var("SENDER_EMAIL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_news_api_key(&self) -> anyhow::Result<&str> {
            self.news_api_key
                .as_deref()
                .context("NEWS_API_KEY is required")
        }

        pub fn require_sentiment_api_url(&self) -> anyhow::Result<&str> {
            self.sentiment_api_url
                .as_deref()
                .context("SENTIMENT_API_URL is required")
        }

        pub fn require_sendgrid_api_key(&self) -> anyhow::Result<&str> {
            self.sendgrid_api_key
                .as_deref()
                .context("SENDGRID_API_KEY is required")
        }

        pub fn require_sender_email(&self) -> anyhow::Result<&str> {
            self.sender_email
                .as_deref()
                .context("SENDER_EMAIL is required")
        }
    }
}
