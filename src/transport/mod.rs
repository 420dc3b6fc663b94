//! Delivery transports.
//!
//! Every transport implements [`EmailTransport`]. `build_transport` turns
//! the [`TransportSettings`] derived at configure time into a ready
//! transport; tests inject their own implementation instead.

mod file;
mod logger;
mod sendmail;
pub mod settings;
mod smtp;

pub use file::{DEFAULT_FILE_LOCATION, FileTransport};
pub use logger::LoggerTransport;
pub use sendmail::SendmailTransport;
pub use settings::{AuthenticationType, SendmailSettings, SmtpSettings, TransportSettings};
pub use smtp::SmtpTransport;

use crate::error::ConfigError;
use async_trait::async_trait;
use lettre::Message;
use std::sync::Arc;

/// Async email transport abstraction.
///
/// Implementations hold only configuration and must be safe to call from
/// several workers at once.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Transport name used in logs, errors and metrics.
    fn kind(&self) -> &str;

    /// Send an email message.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Email handed off successfully
    /// * `Err(String)` - Error message describing the failure
    async fn send_email(&self, message: Message) -> Result<(), String>;
}

/// Builds the transport for the given settings.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedTransport`] for a named transport other
/// than `file` or `logger`, and [`ConfigError::InvalidOption`] when the
/// settings cannot be honoured (for example `cram_md5` authentication).
pub fn build_transport(
    settings: &TransportSettings,
) -> Result<Arc<dyn EmailTransport>, ConfigError> {
    match settings {
        TransportSettings::Smtp(smtp) => Ok(Arc::new(SmtpTransport::from_settings(smtp)?)),
        TransportSettings::Sendmail(sendmail) => Ok(Arc::new(SendmailTransport::new(sendmail))),
        TransportSettings::Named { name, raw_options } => match name.as_str() {
            "file" => Ok(Arc::new(FileTransport::from_options(raw_options)?)),
            "logger" => Ok(Arc::new(LoggerTransport)),
            _ => Err(ConfigError::UnsupportedTransport { name: name.clone() }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportOptions;

    fn build(via: &str, options: TransportOptions) -> Result<Arc<dyn EmailTransport>, ConfigError> {
        build_transport(&TransportSettings::from_config(via, &options)?)
    }

    #[tokio::test]
    async fn builds_every_supported_transport() {
        assert_eq!(build("smtp", TransportOptions::new()).unwrap().kind(), "smtp");
        assert_eq!(build("sendmail", TransportOptions::new()).unwrap().kind(), "sendmail");
        assert_eq!(build("file", TransportOptions::new()).unwrap().kind(), "file");
        assert_eq!(build("logger", TransportOptions::new()).unwrap().kind(), "logger");
    }

    #[test]
    fn unknown_named_transport_is_unsupported() {
        let err = build("carrier_pigeon", TransportOptions::new()).err().unwrap();
        match err {
            ConfigError::UnsupportedTransport { name } => assert_eq!(name, "carrier_pigeon"),
            e => panic!("Expected UnsupportedTransport, got {:?}", e),
        }
    }
}
