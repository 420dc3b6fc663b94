//! End-to-end tests: JSON-lines events through `run_pipeline` into a
//! recording transport.

use async_trait::async_trait;
use lettre::Message;
use mailout::config::{AddressSpec, EmailConfig};
use mailout::{EmailOutput, EmailTransport, PipelineStats, run_pipeline};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Recording transport
// =============================================================================

/// Captured email for verification.
#[derive(Debug, Clone)]
struct SentEmail {
    to: Vec<String>,
    subject: String,
    raw: String,
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    fn kind(&self) -> &str {
        "recording"
    }

    async fn send_email(&self, message: Message) -> Result<(), String> {
        let to = message
            .envelope()
            .to()
            .iter()
            .map(|a| a.to_string())
            .collect();
        let subject = message
            .headers()
            .get_raw("Subject")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        self.sent.lock().unwrap().push(SentEmail { to, subject, raw });
        Ok(())
    }
}

async fn run(config: EmailConfig, input: &str) -> (PipelineStats, Vec<SentEmail>) {
    let transport = Arc::new(RecordingTransport::default());
    let output = EmailOutput::with_transport(config, transport.clone()).unwrap();
    let stats = run_pipeline(&output, input.as_bytes(), CancellationToken::new())
        .await
        .unwrap();
    (stats, transport.sent())
}

fn base_config() -> EmailConfig {
    EmailConfig {
        from: "alerts@example.com".to_string(),
        subject: "[%{host}] %{message}".to_string(),
        ..EmailConfig::new("%{to_addr}")
    }
}

/// Top-level Content-Type of a serialized message.
fn top_content_type(raw: &str) -> String {
    raw.lines()
        .find_map(|line| line.strip_prefix("Content-Type: "))
        .unwrap_or_default()
        .to_ascii_lowercase()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn array_field_expands_to_recipients() {
    let input = concat!(
        r#"{"host": "web-01", "message": "disk full", "#,
        r#""to_addr": ["email1@host.com", "email2@host.com"]}"#,
    );
    let (stats, sent) = run(base_config(), input).await;

    assert_eq!(stats.delivered, 1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["email1@host.com", "email2@host.com"]);
    assert_eq!(sent[0].subject, "[web-01] disk full");
}

#[tokio::test]
async fn array_of_one_comma_joined_string_is_flattened() {
    let config = EmailConfig {
        to: AddressSpec::from(vec!["email1@host.com, email2@host.com"]),
        ..base_config()
    };
    let (_, sent) = run(config, r#"{"host": "h", "message": "m"}"#).await;
    assert_eq!(sent[0].to, vec!["email1@host.com", "email2@host.com"]);
}

#[tokio::test]
async fn escaped_newlines_arrive_as_crlf() {
    let config = EmailConfig {
        body: "Line1\\nLine2\\nLine3".to_string(),
        ..base_config()
    };
    let input = r#"{"host": "h", "message": "m", "to_addr": "ops@example.com"}"#;
    let (_, sent) = run(config, input).await;
    assert!(sent[0].raw.contains("Line1\r\nLine2\r\nLine3"), "{}", sent[0].raw);
}

#[tokio::test]
async fn body_and_html_make_two_part_alternative() {
    let config = EmailConfig {
        body: "plain %{message}".to_string(),
        html_body: "<b>%{message}</b>".to_string(),
        ..base_config()
    };
    let input = r#"{"host": "h", "message": "m", "to_addr": "ops@example.com"}"#;
    let (_, sent) = run(config, input).await;

    let raw = &sent[0].raw;
    assert!(top_content_type(raw).starts_with("multipart/alternative"));
    let lower = raw.to_ascii_lowercase();
    let plain_at = lower.find("content-type: text/plain").unwrap();
    let html_at = lower.find("content-type: text/html").unwrap();
    assert!(plain_at < html_at);
    assert!(raw.contains("plain m"));
    assert!(raw.contains("<b>m</b>"));
}

#[tokio::test]
async fn single_body_is_not_multipart() {
    let input = r#"{"host": "h", "message": "m", "to_addr": "ops@example.com"}"#;

    let config = EmailConfig {
        body: "text only".to_string(),
        ..base_config()
    };
    let (_, sent) = run(config, input).await;
    assert!(top_content_type(&sent[0].raw).starts_with("text/plain"));
    assert!(!sent[0].raw.contains("multipart"));

    let config = EmailConfig {
        html_body: "<i>html only</i>".to_string(),
        ..base_config()
    };
    let (_, sent) = run(config, input).await;
    assert!(top_content_type(&sent[0].raw).starts_with("text/html"));
    assert!(!sent[0].raw.contains("multipart"));
}

#[tokio::test]
async fn template_file_renders_event_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alert.html");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"<h1>{{message}}</h1>")
        .unwrap();

    let config = EmailConfig {
        html_body: "<p>ignored</p>".to_string(),
        template_file: Some(path),
        ..base_config()
    };
    let input = r#"{"host": "h", "message": "hello", "to_addr": "ops@example.com"}"#;
    let (_, sent) = run(config, input).await;

    assert!(sent[0].raw.contains("<h1>hello</h1>"));
    assert!(!sent[0].raw.contains("ignored"));
}

#[tokio::test]
async fn attachments_are_embedded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    std::fs::write(&first, "one").unwrap();
    std::fs::write(&second, "two").unwrap();

    let config = EmailConfig {
        body: "see attached".to_string(),
        attachments: vec![first, second],
        ..base_config()
    };
    let input = r#"{"host": "h", "message": "m", "to_addr": "ops@example.com"}"#;
    let (_, sent) = run(config, input).await;

    let raw = &sent[0].raw;
    assert!(top_content_type(raw).starts_with("multipart/mixed"));
    assert!(raw.find("first.txt").unwrap() < raw.find("second.txt").unwrap());
}

#[tokio::test]
async fn failures_do_not_stop_the_pipeline() {
    let input = concat!(
        r#"{"host": "a", "message": "m", "to_addr": "ok@example.com"}"#,
        "\n",
        r#"{"host": "b", "message": "m", "to_addr": "not an address"}"#,
        "\n",
        "garbage\n",
        r#"{"host": "c", "message": "m", "to_addr": "ok@example.com"}"#,
        "\n",
    );
    let (stats, sent) = run(base_config(), input).await;

    assert_eq!(
        stats,
        PipelineStats {
            received: 3,
            delivered: 2,
            failed: 1,
            skipped: 1,
        }
    );
    let subjects: Vec<_> = sent.iter().map(|s| s.subject.as_str()).collect();
    assert_eq!(subjects, vec!["[a] m", "[c] m"]);
}
