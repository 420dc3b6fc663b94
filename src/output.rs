//! The email output: one email per event.
//!
//! `EmailOutput::configure` validates the configuration once and derives the
//! transport. `deliver` then builds a fresh message for each event and hands
//! it to the transport. A failed delivery is logged once and returned; it is
//! never retried and never panics.

use crate::address::AddressList;
use crate::config::{AddressSpec, EmailConfig};
use crate::error::{ConfigError, DeliveryError};
use crate::event::Event;
use crate::interpolate::{interpolate, unescape_newlines};
use crate::message::{OutgoingMessage, ResolvedFields};
use crate::template::TemplateRenderer;
use crate::transport::{EmailTransport, TransportSettings, build_transport};
use lettre::message::header::ContentType;
use std::sync::Arc;
use tracing::Instrument;

/// Configured email output. Immutable after `configure`; cheap to clone and
/// safe to share between workers.
#[derive(Clone)]
pub struct EmailOutput {
    config: Arc<EmailConfig>,
    settings: Arc<TransportSettings>,
    transport: Arc<dyn EmailTransport>,
    template: Option<Arc<TemplateRenderer>>,
}

impl EmailOutput {
    /// Validate the configuration and build the transport it names.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::MissingField`] - `to` is absent or blank
    /// * [`ConfigError::ValidationError`] - `contentType` does not parse
    /// * [`ConfigError::InvalidTemplate`] - `templateFile` cannot be loaded
    /// * [`ConfigError::InvalidOption`] - a transport option is unusable
    /// * [`ConfigError::UnsupportedTransport`] - `via` names no known transport
    pub fn configure(config: EmailConfig) -> Result<Self, ConfigError> {
        let settings = Self::derive_settings(&config)?;
        let transport = build_transport(&settings)?;
        Self::assemble(config, settings, transport)
    }

    /// Like [`configure`](Self::configure), but delivers through the given
    /// transport instead of the one `via` names.
    pub fn with_transport(
        config: EmailConfig,
        transport: Arc<dyn EmailTransport>,
    ) -> Result<Self, ConfigError> {
        let settings = Self::derive_settings(&config)?;
        Self::assemble(config, settings, transport)
    }

    fn derive_settings(config: &EmailConfig) -> Result<TransportSettings, ConfigError> {
        if config.to.is_blank() {
            return Err(ConfigError::MissingField {
                field: "to".to_string(),
            });
        }

        ContentType::parse(&config.content_type).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid contentType '{}': {}",
                config.content_type, e
            ))
        })?;

        let settings = TransportSettings::from_config(&config.via, &config.transport_options)?;
        tracing::debug!(settings = ?settings, "Derived transport settings");
        Ok(settings)
    }

    fn assemble(
        config: EmailConfig,
        settings: TransportSettings,
        transport: Arc<dyn EmailTransport>,
    ) -> Result<Self, ConfigError> {
        let template = config
            .template_file
            .as_deref()
            .map(TemplateRenderer::from_file)
            .transpose()?
            .map(Arc::new);

        tracing::info!(
            via = %settings.kind(),
            transport = %transport.kind(),
            template = template.as_ref().map(|t| t.name()).unwrap_or("none"),
            attachments = config.attachments.len(),
            "Email output configured"
        );

        Ok(Self {
            config: Arc::new(config),
            settings: Arc::new(settings),
            transport,
            template,
        })
    }

    /// Transport settings derived at configure time.
    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Resolve every template against the event and assemble the message.
    ///
    /// Attachments are read here; a missing one fails the whole message.
    pub fn compose(&self, event: &Event) -> Result<OutgoingMessage, DeliveryError> {
        self.compose_to(event, resolve_addresses(&self.config.to, event))
    }

    fn compose_to(
        &self,
        event: &Event,
        to: AddressList,
    ) -> Result<OutgoingMessage, DeliveryError> {
        let html_body = match &self.template {
            Some(template) => template.render(event)?,
            None => interpolate(&self.config.html_body, event),
        };

        let fields = ResolvedFields {
            from: interpolate(&self.config.from, event).trim().to_string(),
            to,
            cc: self
                .config
                .cc
                .as_ref()
                .map(|cc| resolve_addresses(cc, event))
                .unwrap_or_default(),
            reply_to: self
                .config
                .reply_to
                .as_deref()
                .map(|r| interpolate(r, event).trim().to_string())
                .filter(|r| !r.is_empty()),
            subject: interpolate(&self.config.subject, event),
            body: unescape_newlines(&interpolate(&self.config.body, event)),
            html_body,
        };

        OutgoingMessage::build(fields, &self.config.content_type, &self.config.attachments)
    }

    /// Deliver one email for the event.
    ///
    /// Failures are logged with one `error!` line and returned. The caller
    /// decides what to do with them; this component never retries.
    pub async fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        let span = tracing::info_span!("deliver", via = %self.settings.kind());
        self.deliver_inner(event).instrument(span).await
    }

    async fn deliver_inner(&self, event: &Event) -> Result<(), DeliveryError> {
        let to = resolve_addresses(&self.config.to, event);

        let result = self.send(event, to.clone()).await;
        match &result {
            Ok(()) => {
                tracing::info!(
                    transport = %self.transport.kind(),
                    to = %to,
                    "Email delivered"
                );
                metrics::counter!("mailout_emails_sent_total").increment(1);
            }
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    transport = %self.transport.kind(),
                    to = %to,
                    error = %e,
                    "Email delivery failed"
                );
                metrics::counter!("mailout_delivery_failures_total", "kind" => e.kind())
                    .increment(1);
            }
        }
        result
    }

    async fn send(&self, event: &Event, to: AddressList) -> Result<(), DeliveryError> {
        let message = self.compose_to(event, to)?.to_lettre()?;
        self.transport
            .send_email(message)
            .await
            .map_err(|message| DeliveryError::Transport {
                transport: self.transport.kind().to_string(),
                message,
            })
    }
}

fn resolve_addresses(spec: &AddressSpec, event: &Event) -> AddressList {
    let resolved: Vec<String> = spec
        .templates()
        .iter()
        .map(|template| interpolate(template, event))
        .collect();
    AddressList::parse(&resolved)
}

impl std::fmt::Debug for EmailOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailOutput")
            .field("via", &self.config.via)
            .field("transport", &self.transport.kind())
            .field("settings", &self.settings)
            .field("template", &self.template)
            .finish()
    }
}
