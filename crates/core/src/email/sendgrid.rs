use crate::config::Settings;
use crate::digest::EmailContent;
use crate::email::EmailClient;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SendGridClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    sender: String,
}

impl SendGridClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_sendgrid_api_key()?.to_string();
        let sender = settings.require_sender_email()?.to_string();
        let base_url =
            std::env::var("SENDGRID_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("SENDGRID_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build sendgrid http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            sender,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl EmailClient for SendGridClient {
    fn provider_name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, to: &str, content: &EmailContent) -> Result<()> {
        let url = format!("{}/v3/mail/send", self.base_url.trim_end_matches('/'));
        let req = MailSendRequest::new(to, &self.sender, content);

        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&req)
            .send()
            .await
            .context("sendgrid request failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("sendgrid HTTP {status}: {body}");
        }

        tracing::info!(%to, subject = %content.subject, "email accepted by provider");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

impl<'a> MailSendRequest<'a> {
    fn new(to: &'a str, from: &'a str, content: &'a EmailContent) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![Address { email: to }],
            }],
            from: Address { email: from },
            subject: &content.subject,
            content: vec![
                Content {
                    r#type: "text/plain",
                    value: &content.text,
                },
                Content {
                    r#type: "text/html",
                    value: &content.html,
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    r#type: &'a str,
    value: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_send_request_serializes_plain_before_html() {
        let content = EmailContent {
            subject: "Subject".to_string(),
            text: "plain".to_string(),
            html: "<p>html</p>".to_string(),
        };
        let req = MailSendRequest::new("to@example.com", "from@example.com", &content);
        let v = serde_json::to_value(&req).unwrap();

        assert_eq!(v["personalizations"][0]["to"][0]["email"], "to@example.com");
        assert_eq!(v["from"]["email"], "from@example.com");
        assert_eq!(v["subject"], "Subject");
        assert_eq!(v["content"][0]["type"], "text/plain");
        assert_eq!(v["content"][1]["type"], "text/html");
    }
}
