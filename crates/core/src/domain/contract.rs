use crate::domain::subscription::{Frequency, NotificationTypes};
use anyhow::ensure;
use serde::Deserialize;

/// Inbound subscribe payload, before validation/normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email: String,
    pub frequency: String,
    #[serde(default)]
    pub notification_types: NotificationTypes,
    #[serde(default)]
    pub portfolio_symbols: Vec<String>,
}

/// Validated subscribe payload; email is trimmed and lowercased, symbols are
/// trimmed with empties dropped (input order kept).
#[derive(Debug, Clone)]
pub struct ValidatedSubscribe {
    pub email: String,
    pub frequency: Frequency,
    pub notification_types: NotificationTypes,
    pub portfolio_symbols: Vec<String>,
}

impl SubscribeRequest {
    pub fn validate(self) -> anyhow::Result<ValidatedSubscribe> {
        let email = normalize_email(&self.email)?;

        let frequency = Frequency::parse(self.frequency.trim()).ok_or_else(|| {
            anyhow::anyhow!(
                "frequency must be one of daily, weekly, off (got {:?})",
                self.frequency
            )
        })?;

        let portfolio_symbols: Vec<String> = self
            .portfolio_symbols
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if self.notification_types.portfolio_alerts {
            ensure!(
                !portfolio_symbols.is_empty(),
                "portfolioSymbols must be non-empty when portfolioAlerts is enabled"
            );
        }

        Ok(ValidatedSubscribe {
            email,
            frequency,
            notification_types: self.notification_types,
            portfolio_symbols,
        })
    }
}

/// Lowercases, trims, and checks the `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> anyhow::Result<String> {
    let email = raw.trim().to_ascii_lowercase();
    ensure!(!email.is_empty(), "email must be non-empty");
    ensure!(is_valid_email(&email), "invalid email format: {email}");
    Ok(email)
}

fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    // Domain needs a dot with something on both sides.
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, frequency: &str) -> SubscribeRequest {
        SubscribeRequest {
            email: email.to_string(),
            frequency: frequency.to_string(),
            notification_types: NotificationTypes {
                general_summary: true,
                portfolio_alerts: false,
            },
            portfolio_symbols: vec![],
        }
    }

    #[test]
    fn normalizes_email_case_and_whitespace() {
        let v = request("  User@Example.COM ", "daily").validate().unwrap();
        assert_eq!(v.email, "user@example.com");
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(request("not-an-email", "daily").validate().is_err());
        assert!(request("a@b", "daily").validate().is_err());
        assert!(request("@example.com", "daily").validate().is_err());
        assert!(request("a b@example.com", "daily").validate().is_err());
        assert!(request("", "daily").validate().is_err());
    }

    #[test]
    fn rejects_unknown_frequency() {
        assert!(request("a@example.com", "hourly").validate().is_err());
    }

    #[test]
    fn trims_symbols_and_keeps_order() {
        let mut req = request("a@example.com", "weekly");
        req.notification_types.portfolio_alerts = true;
        req.portfolio_symbols = vec![
            " RELIANCE.NS ".to_string(),
            String::new(),
            "TCS.NS".to_string(),
        ];
        let v = req.validate().unwrap();
        assert_eq!(v.portfolio_symbols, vec!["RELIANCE.NS", "TCS.NS"]);
    }

    #[test]
    fn alerts_without_symbols_are_rejected() {
        let mut req = request("a@example.com", "daily");
        req.notification_types.portfolio_alerts = true;
        req.portfolio_symbols = vec!["  ".to_string()];
        assert!(req.validate().is_err());
    }
}
