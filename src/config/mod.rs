//! Configuration loading for mailout.
//!
//! This module handles the YAML configuration file, the raw transport
//! option map, environment variables for secrets, and template files.

mod env;
mod options;
mod secret;
mod types;

// Re-exports publics
pub use env::{MAX_TEMPLATE_FILE_SIZE, read_template_file, resolve_env_vars};
pub use options::TransportOptions;
pub use secret::{REDACTED, SecretString};
pub use types::{
    AddressSpec, Config, DEFAULT_CONFIG_PATH, DEFAULT_CONTENT_TYPE, DEFAULT_FROM, DEFAULT_VIA,
    EmailConfig, MetricsConfig,
};
