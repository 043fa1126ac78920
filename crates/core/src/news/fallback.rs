use crate::domain::article::Article;
use chrono::{DateTime, Utc};

/// Static article set served when the news provider is unreachable or not
/// configured. General-news requests never fail outright; they degrade to
/// this set.
pub fn fallback_articles() -> Vec<Article> {
    SAMPLE
        .iter()
        .map(|(title, url, source, date)| Article {
            id: (*url).to_string(),
            title: (*title).to_string(),
            description: None,
            url: (*url).to_string(),
            source: (*source).to_string(),
            published_at: parse_date(date),
            symbol: None,
            sentiment: None,
            reasoning: None,
            compound: None,
        })
        .collect()
}

fn parse_date(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

const SAMPLE: &[(&str, &str, &str, &str)] = &[
    (
        "Reliance Industries stock soars 5% on strong Q1 results",
        "https://example.com/news/reliance-q1",
        "Moneycontrol",
        "2025-07-07T10:00:00Z",
    ),
    (
        "TCS inks major deal with European client",
        "https://example.com/news/tcs-deal",
        "Economic Times",
        "2025-07-07T09:30:00Z",
    ),
    (
        "Infosys faces headwinds from global tech slowdown",
        "https://example.com/news/infosys-slowdown",
        "Livemint",
        "2025-07-06T18:00:00Z",
    ),
    (
        "Indian market sentiment positive ahead of budget session",
        "https://example.com/news/market-budget",
        "Business Standard",
        "2025-07-07T11:00:00Z",
    ),
    (
        "New government policy boosts renewable energy sector stocks",
        "https://example.com/news/renewable-policy",
        "Financial Express",
        "2025-07-07T08:00:00Z",
    ),
    (
        "HDFC Bank announces new lending rates",
        "https://example.com/news/hdfc-rates",
        "Moneycontrol",
        "2025-07-07T12:00:00Z",
    ),
    (
        "SBI shares jump on strong asset quality report",
        "https://example.com/news/sbi-quality",
        "The Hindu BusinessLine",
        "2025-07-07T13:00:00Z",
    ),
    (
        "Maruti Suzuki sales figures exceed expectations",
        "https://example.com/news/maruti-sales",
        "NDTV Profit",
        "2025-07-07T09:00:00Z",
    ),
];
