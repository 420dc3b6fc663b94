//! SMTP delivery through lettre.

use super::EmailTransport;
use super::settings::{AuthenticationType, SmtpSettings};
use crate::error::ConfigError;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP transport wrapping `AsyncSmtpTransport<Tokio1Executor>`.
///
/// One connection is opened per message; nothing is pooled.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
    server: String,
    debug: bool,
}

impl SmtpTransport {
    /// Build the client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for `cram_md5`, for an
    /// authentication type without both credentials, or when TLS parameters
    /// cannot be created.
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, ConfigError> {
        let invalid = |option: &str, message: String| ConfigError::InvalidOption {
            transport: "smtp".to_string(),
            option: option.to_string(),
            message,
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.address)
                .port(settings.port)
                .hello_name(ClientId::Domain(settings.domain.clone()));

        if settings.timeout.is_some() {
            builder = builder.timeout(settings.timeout);
        }

        if settings.starttls {
            let parameters = TlsParameters::new(settings.address.clone())
                .map_err(|e| invalid("starttls", format!("TLS configuration error: {}", e)))?;
            builder = builder.tls(Tls::Opportunistic(parameters));
        }

        let mechanism = match settings.authentication {
            None => {
                if settings.username.is_some() {
                    tracing::warn!(
                        server = %settings.address,
                        "userName set without authenticationType; credentials will not be sent"
                    );
                }
                None
            }
            Some(AuthenticationType::Plain) => Some(Mechanism::Plain),
            Some(AuthenticationType::Login) => Some(Mechanism::Login),
            Some(AuthenticationType::CramMd5) => {
                return Err(invalid(
                    "authenticationType",
                    "cram_md5 is not supported; use plain or login".to_string(),
                ));
            }
        };

        if let Some(mechanism) = mechanism {
            let (Some(username), Some(password)) = (&settings.username, &settings.password) else {
                return Err(invalid(
                    "authenticationType",
                    "userName and password are required when authenticationType is set"
                        .to_string(),
                ));
            };
            builder = builder
                .credentials(Credentials::new(
                    username.clone(),
                    password.expose().to_string(),
                ))
                .authentication(vec![mechanism]);
        }

        Ok(Self {
            inner: builder.build(),
            server: format!("{}:{}", settings.address, settings.port),
            debug: settings.debug,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    fn kind(&self) -> &str {
        "smtp"
    }

    async fn send_email(&self, message: Message) -> Result<(), String> {
        if self.debug {
            let envelope = message.envelope();
            tracing::debug!(
                server = %self.server,
                mail_from = ?envelope.from().map(|a| a.to_string()),
                rcpt_to = ?envelope.to().iter().map(|a| a.to_string()).collect::<Vec<_>>(),
                size = message.formatted().len(),
                "SMTP envelope"
            );
        }

        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| format!("{}: {}", self.server, e))
    }
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("server", &self.server)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            address: "mail.example.com".to_string(),
            port: 587,
            ..SmtpSettings::default()
        }
    }

    #[tokio::test]
    async fn builds_without_authentication() {
        let transport = SmtpTransport::from_settings(&settings()).unwrap();
        assert_eq!(transport.kind(), "smtp");
        assert_eq!(transport.server, "mail.example.com:587");
    }

    #[tokio::test]
    async fn builds_with_login_and_starttls() {
        let settings = SmtpSettings {
            username: Some("alerts".to_string()),
            password: Some(SecretString::new("hunter2".to_string())),
            authentication: Some(AuthenticationType::Login),
            starttls: true,
            ..settings()
        };
        assert!(SmtpTransport::from_settings(&settings).is_ok());
    }

    #[tokio::test]
    async fn username_without_authentication_type_still_builds() {
        let settings = SmtpSettings {
            username: Some("alerts".to_string()),
            ..settings()
        };
        assert!(SmtpTransport::from_settings(&settings).is_ok());
    }

    #[test]
    fn cram_md5_is_rejected() {
        let settings = SmtpSettings {
            username: Some("alerts".to_string()),
            password: Some(SecretString::new("hunter2".to_string())),
            authentication: Some(AuthenticationType::CramMd5),
            ..settings()
        };
        let err = SmtpTransport::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("cram_md5"));
    }

    #[test]
    fn authentication_without_credentials_is_rejected() {
        let settings = SmtpSettings {
            authentication: Some(AuthenticationType::Plain),
            ..settings()
        };
        let err = SmtpTransport::from_settings(&settings).unwrap_err();
        match err {
            ConfigError::InvalidOption { option, .. } => assert_eq!(option, "authenticationType"),
            e => panic!("Expected InvalidOption, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn debug_output_has_no_credentials() {
        let settings = SmtpSettings {
            username: Some("alerts".to_string()),
            password: Some(SecretString::new("hunter2".to_string())),
            authentication: Some(AuthenticationType::Plain),
            ..settings()
        };
        let transport = SmtpTransport::from_settings(&settings).unwrap();
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("hunter2"));
    }
}
