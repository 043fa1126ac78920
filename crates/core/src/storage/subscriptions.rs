use crate::domain::contract::ValidatedSubscribe;
use crate::domain::subscription::{
    Frequency, NotificationTypes, Subscription, SubscriptionStatus,
};
use anyhow::Context;
use chrono::{DateTime, Utc};

/// Outcome of an upsert attempt. `Conflict` can only surface from a
/// concurrent insert race on the email key; normal re-subscribes update in
/// place.
#[derive(Debug)]
pub enum UpsertOutcome {
    Saved(Subscription),
    Conflict,
}

type SubscriptionRow = (
    String,
    String,
    bool,
    bool,
    Vec<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

pub async fn upsert_subscription(
    pool: &sqlx::PgPool,
    req: &ValidatedSubscribe,
) -> anyhow::Result<UpsertOutcome> {
    let res = sqlx::query_as::<_, SubscriptionRow>(
        "INSERT INTO subscriptions \
             (email, frequency, general_summary, portfolio_alerts, portfolio_symbols, status, subscribed_at, last_updated) \
         VALUES ($1, $2, $3, $4, $5, 'active', now(), now()) \
         ON CONFLICT (email) DO UPDATE \
             SET frequency = EXCLUDED.frequency, \
                 general_summary = EXCLUDED.general_summary, \
                 portfolio_alerts = EXCLUDED.portfolio_alerts, \
                 portfolio_symbols = EXCLUDED.portfolio_symbols, \
                 status = 'active', \
                 last_updated = now() \
         RETURNING email, frequency, general_summary, portfolio_alerts, portfolio_symbols, status, subscribed_at, last_updated",
    )
    .bind(&req.email)
    .bind(req.frequency.as_str())
    .bind(req.notification_types.general_summary)
    .bind(req.notification_types.portfolio_alerts)
    .bind(&req.portfolio_symbols)
    .fetch_one(pool)
    .await;

    match res {
        Ok(row) => Ok(UpsertOutcome::Saved(row_into_subscription(row)?)),
        Err(err) if is_unique_violation(&err) => Ok(UpsertOutcome::Conflict),
        Err(err) => Err(err).context("upsert subscription failed"),
    }
}

pub async fn get_subscription(
    pool: &sqlx::PgPool,
    email: &str,
) -> anyhow::Result<Option<Subscription>> {
    let row = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT email, frequency, general_summary, portfolio_alerts, portfolio_symbols, status, subscribed_at, last_updated \
         FROM subscriptions \
         WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("fetch subscription failed")?;

    row.map(row_into_subscription).transpose()
}

pub async fn list_active_subscriptions(
    pool: &sqlx::PgPool,
) -> anyhow::Result<Vec<Subscription>> {
    let rows = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT email, frequency, general_summary, portfolio_alerts, portfolio_symbols, status, subscribed_at, last_updated \
         FROM subscriptions \
         WHERE status = 'active' \
         ORDER BY subscribed_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("list active subscriptions failed")?;

    rows.into_iter().map(row_into_subscription).collect()
}

/// Deletes by email; false means no such subscription existed.
pub async fn remove_subscription(pool: &sqlx::PgPool, email: &str) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM subscriptions WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await
        .context("delete subscription failed")?;
    Ok(res.rows_affected() > 0)
}

fn row_into_subscription(row: SubscriptionRow) -> anyhow::Result<Subscription> {
    let (
        email,
        frequency,
        general_summary,
        portfolio_alerts,
        portfolio_symbols,
        status,
        subscribed_at,
        last_updated,
    ) = row;

    let frequency = Frequency::parse(&frequency)
        .with_context(|| format!("invalid frequency in DB for {email}: {frequency:?}"))?;
    let status = SubscriptionStatus::parse(&status)
        .with_context(|| format!("invalid status in DB for {email}: {status:?}"))?;

    Ok(Subscription {
        email,
        frequency,
        notification_types: NotificationTypes {
            general_summary,
            portfolio_alerts,
        },
        portfolio_symbols,
        status,
        subscribed_at,
        last_updated,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
