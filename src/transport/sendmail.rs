//! Local mail-transfer agent delivery.

use super::EmailTransport;
use super::settings::SendmailSettings;
use async_trait::async_trait;
use lettre::Message;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Pipes each message to a sendmail-compatible binary.
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    location: PathBuf,
    arguments: Vec<String>,
}

impl SendmailTransport {
    pub fn new(settings: &SendmailSettings) -> Self {
        Self {
            location: settings.location.clone(),
            arguments: settings.arguments.clone(),
        }
    }
}

#[async_trait]
impl EmailTransport for SendmailTransport {
    fn kind(&self) -> &str {
        "sendmail"
    }

    async fn send_email(&self, message: Message) -> Result<(), String> {
        let location = self.location.display();

        let mut child = Command::new(&self.location)
            .args(&self.arguments)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to run {}: {}", location, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&message.formatted())
                .await
                .map_err(|e| format!("failed to write message to {}: {}", location, e))?;
            stdin
                .shutdown()
                .await
                .map_err(|e| format!("failed to close stdin of {}: {}", location, e))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| format!("failed to wait for {}: {}", location, e))?;

        if output.status.success() {
            tracing::debug!(location = %location, "Message handed to sendmail");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "{} exited with {}: {}",
                location,
                output.status,
                stderr.trim()
            ))
        }
    }
}
