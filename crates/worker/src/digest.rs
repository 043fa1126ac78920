use anyhow::Context;
use chrono::NaiveDate;
use marketbrief_core::digest;
use marketbrief_core::domain::article::Article;
use marketbrief_core::domain::sentiment::SentimentResult;
use marketbrief_core::domain::subscription::{Frequency, Subscription};
use marketbrief_core::email::EmailClient;
use marketbrief_core::news::{fallback, NewsProvider};
use marketbrief_core::sentiment::{aggregate, SentimentClient};
use marketbrief_core::storage;

/// Headlines listed in the general digest body.
const DIGEST_HEADLINES: usize = 10;

#[derive(Debug, Default)]
pub struct RunReport {
    pub subscribers: usize,
    pub digests_sent: u64,
    pub alerts_sent: u64,
}

/// One scheduler run: load active subscribers, fetch + aggregate the general
/// feed once, then deliver per subscriber. A failure for one subscriber is
/// logged and never blocks the rest.
pub async fn run_daily_digest(
    pool: &sqlx::PgPool,
    news: &dyn NewsProvider,
    sentiment: &dyn SentimentClient,
    email: &dyn EmailClient,
    run_date: NaiveDate,
    dry_run: bool,
) -> anyhow::Result<RunReport> {
    let subscriptions = storage::subscriptions::list_active_subscriptions(pool)
        .await
        .context("load active subscriptions failed")?;

    let mut report = RunReport {
        subscribers: subscriptions.len(),
        ..RunReport::default()
    };

    if subscriptions.is_empty() {
        tracing::info!(%run_date, "no active subscriptions; nothing to send");
        return Ok(report);
    }

    // One general fetch + aggregate per run, shared across subscribers.
    let (general_articles, overall) = fetch_general_once(news, sentiment).await;
    let general_content = digest::compose_general_digest(&overall, &general_articles);

    let weekly_due = crate::schedule::weekly_due(run_date);

    for sub in &subscriptions {
        if !due_today(sub, weekly_due) {
            continue;
        }

        if sub.wants_general_summary() {
            if dry_run {
                tracing::info!(email = %sub.email, dry_run = true, "would send general digest");
            } else {
                match email.send(&sub.email, &general_content).await {
                    Ok(()) => {
                        report.digests_sent += 1;
                        tracing::info!(email = %sub.email, "sent general digest");
                    }
                    Err(err) => {
                        tracing::error!(email = %sub.email, error = %err, "failed to send general digest");
                    }
                }
            }
        }

        if sub.wants_portfolio_alerts() {
            match send_portfolio_alert(news, sentiment, email, sub, dry_run).await {
                Ok(true) => report.alerts_sent += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(email = %sub.email, error = %err, "failed to send portfolio alert");
                }
            }
        }
    }

    Ok(report)
}

fn due_today(sub: &Subscription, weekly_due: bool) -> bool {
    match sub.frequency {
        Frequency::Daily => true,
        Frequency::Weekly => weekly_due,
        Frequency::Off => false,
    }
}

async fn fetch_general_once(
    news: &dyn NewsProvider,
    sentiment: &dyn SentimentClient,
) -> (Vec<Article>, SentimentResult) {
    let articles = match news.fetch_general().await {
        Ok(articles) if !articles.is_empty() => articles,
        Ok(_) => {
            tracing::warn!("news api returned no articles; using fallback set");
            fallback::fallback_articles()
        }
        Err(err) => {
            tracing::warn!(error = %err, "general news fetch failed; using fallback set");
            fallback::fallback_articles()
        }
    };

    let headlines: Vec<Article> = articles.into_iter().take(DIGEST_HEADLINES).collect();
    let scored = aggregate::score_articles(sentiment, headlines).await;
    let overall = scored.overall();
    (scored.articles, overall)
}

/// Fetches, scores, and strong-filters this subscriber's symbol news; sends
/// only when at least one article clears the bar. Returns whether an alert
/// went out.
async fn send_portfolio_alert(
    news: &dyn NewsProvider,
    sentiment: &dyn SentimentClient,
    email: &dyn EmailClient,
    sub: &Subscription,
    dry_run: bool,
) -> anyhow::Result<bool> {
    let mut articles = Vec::new();
    for symbol in &sub.portfolio_symbols {
        match news.fetch_for_symbol(symbol).await {
            Ok(mut batch) => articles.append(&mut batch),
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "symbol news fetch failed; skipping symbol");
            }
        }
    }

    if articles.is_empty() {
        tracing::info!(email = %sub.email, "no portfolio news found");
        return Ok(false);
    }

    let scored = aggregate::score_articles(sentiment, articles).await;
    let strong = digest::strong_signals(&scored.articles);
    if strong.is_empty() {
        tracing::info!(email = %sub.email, "no strong signals for portfolio");
        return Ok(false);
    }

    if dry_run {
        tracing::info!(
            email = %sub.email,
            alerts = strong.len(),
            dry_run = true,
            "would send portfolio alert"
        );
        return Ok(false);
    }

    let content = digest::compose_portfolio_alert(&strong);
    email
        .send(&sub.email, &content)
        .await
        .context("portfolio alert send failed")?;

    tracing::info!(
        email = %sub.email,
        symbols = ?sub.portfolio_symbols,
        alerts = strong.len(),
        "sent portfolio alert"
    );
    Ok(true)
}
