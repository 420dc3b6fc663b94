// src/lib.rs
//! mailout - renders one email per event and delivers it over SMTP,
//! sendmail, or a local file/log transport.

pub mod address;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod interpolate;
pub mod message;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod template;
pub mod transport;

// Re-export commonly used types
pub use address::AddressList;
pub use cli::LogFormat;
pub use config::{AddressSpec, EmailConfig};
pub use error::{ConfigError, DeliveryError};
pub use event::Event;
pub use message::{MessageBody, OutgoingMessage};
pub use metrics::{MetricsServer, register_metric_descriptions};
pub use output::EmailOutput;
pub use pipeline::{PipelineStats, run_pipeline};
pub use template::TemplateRenderer;
pub use transport::{EmailTransport, TransportSettings};
