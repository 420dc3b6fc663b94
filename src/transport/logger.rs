//! Logs messages instead of sending them.

use super::EmailTransport;
use async_trait::async_trait;
use lettre::Message;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerTransport;

#[async_trait]
impl EmailTransport for LoggerTransport {
    fn kind(&self) -> &str {
        "logger"
    }

    async fn send_email(&self, message: Message) -> Result<(), String> {
        let formatted = message.formatted();
        tracing::info!(
            size = formatted.len(),
            email = %String::from_utf8_lossy(&formatted),
            "Email not sent (logger transport)"
        );
        Ok(())
    }
}
