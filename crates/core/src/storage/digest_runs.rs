use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub async fn record_success(
    pool: &sqlx::PgPool,
    run_date: NaiveDate,
    started_at: DateTime<Utc>,
    digests_sent: u64,
    alerts_sent: u64,
) -> anyhow::Result<Uuid> {
    insert_run(
        pool,
        run_date,
        started_at,
        "success",
        digests_sent,
        alerts_sent,
        None,
    )
    .await
}

pub async fn record_failure(
    pool: &sqlx::PgPool,
    run_date: NaiveDate,
    started_at: DateTime<Utc>,
    error: &str,
) -> anyhow::Result<Uuid> {
    insert_run(pool, run_date, started_at, "error", 0, 0, Some(error)).await
}

async fn insert_run(
    pool: &sqlx::PgPool,
    run_date: NaiveDate,
    started_at: DateTime<Utc>,
    status: &str,
    digests_sent: u64,
    alerts_sent: u64,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let finished_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO digest_runs (id, run_date, started_at, finished_at, status, digests_sent, alerts_sent, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(id)
    .bind(run_date)
    .bind(started_at)
    .bind(finished_at)
    .bind(status)
    .bind(digests_sent as i64)
    .bind(alerts_sent as i64)
    .bind(error)
    .execute(pool)
    .await
    .context("insert digest_runs failed")?;

    Ok(id)
}
