//! Centralized error types for mailout using thiserror.
//!
//! Configuration problems are fatal and surface from `EmailOutput::configure`.
//! Delivery problems are per-event: they are logged and returned, never raised.

use thiserror::Error;

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    #[error("invalid template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },
    #[error("unsupported transport '{name}'")]
    UnsupportedTransport { name: String },
    #[error("invalid {transport} option '{option}': {message}")]
    InvalidOption {
        transport: String,
        option: String,
        message: String,
    },
}

/// Errors that fail the delivery of a single event.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("{transport} transport failed: {message}")]
    Transport { transport: String, message: String },
    #[error("cannot read attachment '{path}': {message}")]
    Attachment { path: String, message: String },
    #[error("template render failed: {0}")]
    TemplateRender(String),
    #[error("invalid '{field}' address '{address}'")]
    InvalidAddress { field: &'static str, address: String },
    #[error("failed to build email: {0}")]
    Build(String),
}

impl DeliveryError {
    /// Short stable label used as a log field and metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::Transport { .. } => "transport",
            DeliveryError::Attachment { .. } => "attachment",
            DeliveryError::TemplateRender(_) => "template",
            DeliveryError::InvalidAddress { .. } | DeliveryError::Build(_) => "build",
        }
    }
}
