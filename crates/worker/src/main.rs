use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketbrief_core::email::sendgrid::SendGridClient;
use marketbrief_core::news::newsapi::NewsApiClient;
use marketbrief_core::sentiment::http::HttpSentimentClient;
use marketbrief_core::storage;

mod digest;
mod schedule;

#[derive(Debug, Parser)]
#[command(name = "marketbrief_worker")]
struct Args {
    /// Run one digest pass immediately and exit (for external cron).
    #[arg(long)]
    once: bool,

    /// Do everything except sending emails.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    storage::migrate(&pool).await?;

    let news = NewsApiClient::from_settings(&settings)?;
    let sentiment = HttpSentimentClient::from_settings(&settings)?;
    let email = SendGridClient::from_settings(&settings)?;

    if args.once {
        run_once(&pool, &news, &sentiment, &email, args.dry_run).await;
        return Ok(());
    }

    let send_time = schedule::SendTime::from_env();
    tracing::info!(
        hour = send_time.hour,
        minute = send_time.minute,
        "daily digest scheduled (IST)"
    );

    // Idle until the slot, run, idle again. One run at a time.
    loop {
        let now = chrono::Utc::now();
        let next = schedule::next_run_after(now, send_time);
        let wait = (next - now)
            .to_std()
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        tracing::info!(%next, wait_secs = wait.as_secs(), "sleeping until next digest run");
        tokio::time::sleep(wait).await;

        run_once(&pool, &news, &sentiment, &email, args.dry_run).await;
    }
}

async fn run_once(
    pool: &sqlx::PgPool,
    news: &NewsApiClient,
    sentiment: &HttpSentimentClient,
    email: &SendGridClient,
    dry_run: bool,
) {
    let started_at = chrono::Utc::now();
    let run_date = schedule::run_date(started_at);
    tracing::info!(%run_date, dry_run, "starting daily digest run");

    match digest::run_daily_digest(pool, news, sentiment, email, run_date, dry_run).await {
        Ok(report) => {
            tracing::info!(
                %run_date,
                subscribers = report.subscribers,
                digests_sent = report.digests_sent,
                alerts_sent = report.alerts_sent,
                "daily digest run finished"
            );
            if !dry_run {
                if let Err(err) = storage::digest_runs::record_success(
                    pool,
                    run_date,
                    started_at,
                    report.digests_sent,
                    report.alerts_sent,
                )
                .await
                {
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(error = %err, "failed to record digest run");
                }
            }
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%run_date, error = %err, "daily digest run failed");
            if !dry_run {
                if let Err(record_err) = storage::digest_runs::record_failure(
                    pool,
                    run_date,
                    started_at,
                    &format!("{err:#}"),
                )
                .await
                {
                    sentry_anyhow::capture_anyhow(&record_err);
                    tracing::error!(error = %record_err, "failed to record digest run failure");
                }
            }
        }
    }
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
