pub mod sendgrid;

use crate::digest::EmailContent;

#[async_trait::async_trait]
pub trait EmailClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Hands one rendered payload to the delivery provider. No retries; a
    /// failure surfaces to the caller.
    async fn send(&self, to: &str, content: &EmailContent) -> anyhow::Result<()>;
}
