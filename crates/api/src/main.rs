use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketbrief_core::digest;
use marketbrief_core::domain::article::Article;
use marketbrief_core::domain::contract::{normalize_email, SubscribeRequest};
use marketbrief_core::domain::sentiment::SentimentResult;
use marketbrief_core::email::sendgrid::SendGridClient;
use marketbrief_core::email::EmailClient;
use marketbrief_core::news::newsapi::NewsApiClient;
use marketbrief_core::news::{fallback, matcher, NewsProvider};
use marketbrief_core::sentiment::aggregate::{self, ScoredArticles};
use marketbrief_core::sentiment::http::HttpSentimentClient;
use marketbrief_core::storage;

/// Articles considered for the market-wide sentiment aggregate.
const GENERAL_SENTIMENT_HEADLINES: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = marketbrief_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let news = match NewsApiClient::from_settings(&settings) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "news api not configured; serving fallback articles");
            None
        }
    };
    let sentiment = match HttpSentimentClient::from_settings(&settings) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "sentiment service not configured");
            None
        }
    };
    let email = match SendGridClient::from_settings(&settings) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "email provider not configured");
            None
        }
    };

    let state = AppState {
        pool,
        news,
        sentiment,
        email,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/news/general", get(get_general_news))
        .route("/news/filtered", post(post_filtered_news))
        .route("/news/general-sentiment", get(get_general_sentiment))
        .route("/notifications/subscribe", post(subscribe))
        .route("/notifications/unsubscribe", post(unsubscribe))
        .route("/notifications/send-test-email", post(send_test_email))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    news: Option<NewsApiClient>,
    sentiment: Option<HttpSentimentClient>,
    email: Option<SendGridClient>,
}

impl AppState {
    fn require_pool(&self) -> Result<&PgPool, ApiError> {
        self.pool
            .as_ref()
            .ok_or_else(|| ApiError::internal("Database unavailable.", "no database connection"))
    }
}

/// Error body is always `{message, error}`, per the API contract.
struct ApiError {
    status: StatusCode,
    message: String,
    error: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            error: "validation failed".to_string(),
        }
    }

    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
            error: "not found".to_string(),
        }
    }

    fn conflict(message: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.to_string(),
            error: "duplicate subscription".to_string(),
        }
    }

    fn internal(message: &str, detail: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            error: detail.to_string(),
        }
    }

    fn from_anyhow(message: &str, err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "{message}");
        Self::internal(message, format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({"message": self.message, "error": self.error});
        (self.status, Json(body)).into_response()
    }
}

/// General news never fails outright; provider errors degrade to the static
/// fallback set.
async fn general_news_or_fallback(state: &AppState) -> Vec<Article> {
    match &state.news {
        Some(client) => match client.fetch_general().await {
            Ok(articles) if !articles.is_empty() => articles,
            Ok(_) => {
                tracing::warn!("news api returned no articles; using fallback set");
                fallback::fallback_articles()
            }
            Err(e) => {
                tracing::warn!(error = %e, "news fetch failed; using fallback set");
                fallback::fallback_articles()
            }
        },
        None => fallback::fallback_articles(),
    }
}

/// Scores through the configured client, or stamps every article with the
/// failure placeholder when no scorer is configured.
async fn score_or_placeholder(state: &AppState, articles: Vec<Article>) -> ScoredArticles {
    match &state.sentiment {
        Some(client) => aggregate::score_articles(client, articles).await,
        None => {
            tracing::warn!("sentiment service not configured; stamping placeholders");
            aggregate::score_articles(&UnconfiguredScorer, articles).await
        }
    }
}

/// Stand-in scorer used when SENTIMENT_API_URL is absent; every call fails,
/// so the aggregator applies its normal placeholder path.
struct UnconfiguredScorer;

#[async_trait::async_trait]
impl marketbrief_core::sentiment::SentimentClient for UnconfiguredScorer {
    fn provider_name(&self) -> &'static str {
        "unconfigured"
    }

    async fn analyze_text(&self, _text: &str) -> anyhow::Result<SentimentResult> {
        anyhow::bail!("sentiment service not configured")
    }
}

async fn get_general_news(State(state): State<AppState>) -> Json<Vec<Article>> {
    Json(general_news_or_fallback(&state).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilteredNewsRequest {
    #[serde(default)]
    portfolio_symbols: Vec<String>,
    notification_email: Option<String>,
}

async fn post_filtered_news(
    State(state): State<AppState>,
    Json(req): Json<FilteredNewsRequest>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let symbols: Vec<String> = req
        .portfolio_symbols
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        return Err(ApiError::bad_request("Portfolio symbols are required."));
    }

    let notify = req
        .notification_email
        .map(|e| normalize_email(&e))
        .transpose()
        .map_err(|e| ApiError::bad_request(&format!("Invalid notification email: {e}")))?;

    let articles = general_news_or_fallback(&state).await;
    let filtered = matcher::filter_by_portfolio(&articles, &symbols)
        .map_err(|e| ApiError::from_anyhow("Error fetching filtered news.", e))?;

    let scored = score_or_placeholder(&state, filtered).await;

    // Optional courtesy alert to the given address; a send failure never
    // fails the request.
    if let Some(to) = notify {
        match &state.email {
            Some(client) => {
                let strong = digest::strong_signals(&scored.articles);
                if strong.is_empty() {
                    tracing::info!(%to, "no strong signals; skipping notification email");
                } else {
                    let content = digest::compose_portfolio_alert(&strong);
                    if let Err(e) = client.send(&to, &content).await {
                        tracing::warn!(%to, error = %e, "failed to send filtered-news alert");
                    }
                }
            }
            None => {
                tracing::warn!(%to, "email provider not configured; skipping notification email")
            }
        }
    }

    Ok(Json(scored.articles))
}

async fn get_general_sentiment(
    State(state): State<AppState>,
) -> Result<Json<SentimentResult>, ApiError> {
    let Some(client) = &state.sentiment else {
        return Err(ApiError::internal(
            "Failed to fetch general market sentiment",
            "sentiment service not configured",
        ));
    };

    let articles = general_news_or_fallback(&state).await;
    let headlines: Vec<Article> = articles
        .into_iter()
        .take(GENERAL_SENTIMENT_HEADLINES)
        .collect();

    let scored = aggregate::score_articles(client, headlines).await;
    Ok(Json(scored.overall()))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let validated = req
        .validate()
        .map_err(|e| ApiError::bad_request(&format!("{e:#}")))?;
    let pool = state.require_pool()?;

    match storage::subscriptions::upsert_subscription(pool, &validated)
        .await
        .map_err(|e| ApiError::from_anyhow("Failed to save subscription.", e))?
    {
        storage::subscriptions::UpsertOutcome::Saved(subscription) => Ok(Json(json!({
            "message": "Subscription saved.",
            "subscription": subscription,
        }))),
        storage::subscriptions::UpsertOutcome::Conflict => Err(ApiError::conflict(
            "A subscription for this email already exists; retry to update your preferences.",
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnsubscribeRequest {
    email: String,
}

async fn unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = normalize_email(&req.email)
        .map_err(|e| ApiError::bad_request(&format!("{e:#}")))?;
    let pool = state.require_pool()?;

    let removed = storage::subscriptions::remove_subscription(pool, &email)
        .await
        .map_err(|e| ApiError::from_anyhow("Failed to remove subscription.", e))?;

    if !removed {
        return Err(ApiError::not_found("No subscription found for this email."));
    }
    Ok(Json(json!({"message": "Unsubscribed successfully."})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestEmailRequest {
    recipient_email: Option<String>,
}

async fn send_test_email(
    State(state): State<AppState>,
    Json(req): Json<TestEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(recipient) = req.recipient_email else {
        return Err(ApiError::bad_request("Recipient email is required."));
    };
    let recipient = normalize_email(&recipient)
        .map_err(|e| ApiError::bad_request(&format!("{e:#}")))?;

    let Some(client) = &state.email else {
        return Err(ApiError::internal(
            "Failed to send test email.",
            "email provider not configured",
        ));
    };

    let content = digest::compose_test_email();
    client
        .send(&recipient, &content)
        .await
        .map_err(|e| ApiError::from_anyhow("Failed to send test email.", e))?;

    Ok(Json(json!({"message": "Test email sent successfully!"})))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(
    settings: &marketbrief_core::config::Settings,
) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
