use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Off,
}

impl Frequency {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "off" => Some(Frequency::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Off => "off",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    PendingConfirmation,
}

impl SubscriptionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "inactive" => Some(SubscriptionStatus::Inactive),
            "pending_confirmation" => Some(SubscriptionStatus::PendingConfirmation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::PendingConfirmation => "pending_confirmation",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTypes {
    #[serde(default)]
    pub general_summary: bool,
    #[serde(default)]
    pub portfolio_alerts: bool,
}

/// Subscriber preference record, upserted by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Unique key; stored trimmed and lowercased.
    pub email: String,
    pub frequency: Frequency,
    pub notification_types: NotificationTypes,
    /// Ordered ticker list; order decides which symbol tags a matched article.
    pub portfolio_symbols: Vec<String>,
    pub status: SubscriptionStatus,
    pub subscribed_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Subscription {
    pub fn wants_general_summary(&self) -> bool {
        self.notification_types.general_summary
    }

    pub fn wants_portfolio_alerts(&self) -> bool {
        self.notification_types.portfolio_alerts && !self.portfolio_symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_round_trips_lowercase() {
        for f in [Frequency::Daily, Frequency::Weekly, Frequency::Off] {
            assert_eq!(Frequency::parse(f.as_str()), Some(f));
        }
        assert_eq!(Frequency::parse("hourly"), None);
        let v = serde_json::to_value(Frequency::Weekly).unwrap();
        assert_eq!(v, serde_json::json!("weekly"));
    }

    #[test]
    fn status_parse_matches_stored_strings() {
        assert_eq!(
            SubscriptionStatus::parse("pending_confirmation"),
            Some(SubscriptionStatus::PendingConfirmation)
        );
        assert_eq!(SubscriptionStatus::parse("deleted"), None);
    }

    #[test]
    fn portfolio_alerts_require_symbols() {
        let sub = Subscription {
            email: "a@b.co".to_string(),
            frequency: Frequency::Daily,
            notification_types: NotificationTypes {
                general_summary: false,
                portfolio_alerts: true,
            },
            portfolio_symbols: vec![],
            status: SubscriptionStatus::Active,
            subscribed_at: Utc::now(),
            last_updated: Utc::now(),
        };
        assert!(!sub.wants_portfolio_alerts());
    }
}
