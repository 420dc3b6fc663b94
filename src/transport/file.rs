//! Writes each message to a directory as an `.eml` file.

use super::EmailTransport;
use crate::config::TransportOptions;
use crate::error::ConfigError;
use async_trait::async_trait;
use lettre::{AsyncFileTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;

/// Directory used when `location` is not configured.
pub const DEFAULT_FILE_LOCATION: &str = "mails";

pub struct FileTransport {
    dir: PathBuf,
    inner: AsyncFileTransport<Tokio1Executor>,
}

impl FileTransport {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            inner: AsyncFileTransport::new(&dir),
            dir,
        }
    }

    pub fn from_options(options: &TransportOptions) -> Result<Self, ConfigError> {
        let dir = options
            .get_str("file", "location")?
            .unwrap_or_else(|| DEFAULT_FILE_LOCATION.to_string());
        Ok(Self::new(PathBuf::from(dir)))
    }
}

#[async_trait]
impl EmailTransport for FileTransport {
    fn kind(&self) -> &str {
        "file"
    }

    async fn send_email(&self, message: Message) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("cannot create {}: {}", self.dir.display(), e))?;

        let id = self
            .inner
            .send(message)
            .await
            .map_err(|e| format!("{}: {}", self.dir.display(), e))?;

        tracing::debug!(dir = %self.dir.display(), id = %id, "Message written");
        Ok(())
    }
}
