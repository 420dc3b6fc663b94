//! Core configuration types and loading.

use super::options::TransportOptions;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mailout/config.yaml";

/// Sender used when `from` is not configured.
pub const DEFAULT_FROM: &str = "logstash.alert@nowhere.com";

/// Content type applied to the HTML part.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// Transport used when `via` is not configured.
pub const DEFAULT_VIA: &str = "smtp";

/// Top-level configuration document.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Email output settings.
    pub email: EmailConfig,
    /// Metrics exposition configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// A relative `templateFile` is resolved against the directory that
    /// contains the configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read.
    /// Returns [`ConfigError::ValidationError`] if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if let Some(config_dir) = path.parent() {
            config.email.resolve_relative_paths(config_dir);
        }

        Ok(config)
    }
}

/// Metrics exposition configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Whether the Prometheus endpoint is started.
    #[serde(default)]
    pub enabled: bool,
    /// Port to expose metrics on (default: 9090).
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// Raw `to`/`cc` value: one template string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AddressSpec {
    One(String),
    Many(Vec<String>),
}

impl AddressSpec {
    /// The configured template strings, in order.
    pub fn templates(&self) -> &[String] {
        match self {
            AddressSpec::One(s) => std::slice::from_ref(s),
            AddressSpec::Many(v) => v,
        }
    }

    /// True when no template contains anything but whitespace and commas.
    pub fn is_blank(&self) -> bool {
        self.templates()
            .iter()
            .all(|t| t.split(',').all(|part| part.trim().is_empty()))
    }
}

impl Default for AddressSpec {
    fn default() -> Self {
        AddressSpec::Many(Vec::new())
    }
}

impl From<&str> for AddressSpec {
    fn from(s: &str) -> Self {
        AddressSpec::One(s.to_string())
    }
}

impl From<String> for AddressSpec {
    fn from(s: String) -> Self {
        AddressSpec::One(s)
    }
}

impl From<Vec<&str>> for AddressSpec {
    fn from(v: Vec<&str>) -> Self {
        AddressSpec::Many(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for AddressSpec {
    fn from(v: Vec<String>) -> Self {
        AddressSpec::Many(v)
    }
}

/// Email output configuration. Immutable once handed to `EmailOutput::configure`.
///
/// Every string except `via`, `contentType` and the paths is a template
/// that may reference event fields with `%{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    /// Recipients. Required; a string, a comma-joined string, or a list.
    #[serde(default)]
    pub to: AddressSpec,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default, alias = "replyto")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Option<AddressSpec>,
    /// `smtp`, `sendmail`, or the name of another transport.
    #[serde(default = "default_via")]
    pub via: String,
    #[serde(default, alias = "options")]
    pub transport_options: TransportOptions,
    #[serde(default)]
    pub subject: String,
    /// Plain-text body. Literal `\n` sequences become line breaks.
    #[serde(default)]
    pub body: String,
    #[serde(default, alias = "htmlbody")]
    pub html_body: String,
    /// Jinja template rendered for the HTML part; overrides `htmlBody`.
    #[serde(default, alias = "template_file")]
    pub template_file: Option<PathBuf>,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    #[serde(default = "default_content_type", alias = "contenttype")]
    pub content_type: String,
}

impl EmailConfig {
    /// Creates a configuration with defaults for everything but `to`.
    pub fn new(to: impl Into<AddressSpec>) -> Self {
        Self {
            to: to.into(),
            ..Self::default()
        }
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        if let Some(path) = &self.template_file
            && path.is_relative()
        {
            self.template_file = Some(base.join(path));
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            to: AddressSpec::default(),
            from: default_from(),
            reply_to: None,
            cc: None,
            via: default_via(),
            transport_options: TransportOptions::default(),
            subject: String::new(),
            body: String::new(),
            html_body: String::new(),
            template_file: None,
            attachments: Vec::new(),
            content_type: default_content_type(),
        }
    }
}

fn default_from() -> String {
    DEFAULT_FROM.to_string()
}

fn default_via() -> String {
    DEFAULT_VIA.to_string()
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}
