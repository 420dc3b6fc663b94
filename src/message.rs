//! Outgoing message assembly.
//!
//! `OutgoingMessage::build` takes strings and lists that have already been
//! resolved against an event and returns a complete, inspectable value.
//! `to_lettre` turns it into the MIME message handed to a transport:
//!
//! ```text
//! body only             text/plain
//! html only             <contentType>
//! body + html           multipart/alternative [text/plain, <contentType>]
//! any + attachments     multipart/mixed [<one of the above>, attachment...]
//! ```

use crate::address::AddressList;
use crate::error::DeliveryError;
use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use std::path::{Path, PathBuf};

/// Content type of the plain-text part.
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=UTF-8";

/// Default content type of the HTML part.
pub const TEXT_HTML_UTF8: &str = "text/html; charset=UTF-8";

/// Body layout chosen from the resolved text and HTML content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Neither body resolved to anything.
    Empty,
    Text(String),
    Html { content: String, content_type: String },
    /// Plain text first, HTML second.
    Alternative {
        text: String,
        html: String,
        html_content_type: String,
    },
}

impl MessageBody {
    /// Picks the layout: two parts only when both contents are non-empty.
    pub fn select(text: String, html: String, html_content_type: &str) -> Self {
        match (text.is_empty(), html.is_empty()) {
            (false, false) => MessageBody::Alternative {
                text,
                html,
                html_content_type: html_content_type.to_string(),
            },
            (false, true) => MessageBody::Text(text),
            (true, false) => MessageBody::Html {
                content: html,
                content_type: html_content_type.to_string(),
            },
            (true, true) => MessageBody::Empty,
        }
    }

    /// The body as one part; an alternative body keeps only its text.
    fn to_single_part(&self) -> Result<SinglePart, DeliveryError> {
        match self {
            MessageBody::Empty => plain_part(String::new()),
            MessageBody::Text(text) | MessageBody::Alternative { text, .. } => {
                plain_part(text.clone())
            }
            MessageBody::Html {
                content,
                content_type,
            } => Ok(SinglePart::builder()
                .header(parse_content_type(content_type)?)
                .body(content.clone())),
        }
    }

}

/// `multipart/alternative` with the plain-text part first.
fn alternative_part(
    text: &str,
    html: &str,
    html_content_type: &str,
) -> Result<MultiPart, DeliveryError> {
    Ok(MultiPart::alternative()
        .singlepart(plain_part(text.to_string())?)
        .singlepart(
            SinglePart::builder()
                .header(parse_content_type(html_content_type)?)
                .body(html.to_string()),
        ))
}

/// One attachment, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPart {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Vec<u8>,
}

impl AttachmentPart {
    /// Reads a file completely; no handle outlives this call.
    pub fn read(path: &Path) -> Result<Self, DeliveryError> {
        let content = std::fs::read(path).map_err(|e| DeliveryError::Attachment {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        Ok(Self {
            filename,
            content_type: guess_content_type(path),
            content,
        })
    }

    fn to_single_part(&self) -> Result<SinglePart, DeliveryError> {
        Ok(Attachment::new(self.filename.clone())
            .body(self.content.clone(), parse_content_type(self.content_type)?))
    }
}

/// Content type from the file extension, `application/octet-stream` otherwise.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("txt") | Some("log") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Header and body values after interpolation, before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub from: String,
    pub to: AddressList,
    pub cc: AddressList,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
    pub html_body: String,
}

/// A fully assembled email, built fresh for every delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: AddressList,
    pub cc: AddressList,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: MessageBody,
    pub attachments: Vec<AttachmentPart>,
}

impl OutgoingMessage {
    /// Assembles the message and reads every attachment in order.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Attachment`] for the first attachment that
    /// cannot be read; nothing is sent in that case.
    pub fn build(
        fields: ResolvedFields,
        html_content_type: &str,
        attachments: &[PathBuf],
    ) -> Result<Self, DeliveryError> {
        let attachments = attachments
            .iter()
            .map(|path| AttachmentPart::read(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            from: fields.from,
            to: fields.to,
            cc: fields.cc,
            reply_to: fields.reply_to,
            subject: fields.subject,
            body: MessageBody::select(fields.body, fields.html_body, html_content_type),
            attachments,
        })
    }

    /// Converts to a MIME message.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidAddress`] when an address is not a
    /// valid mailbox and [`DeliveryError::Build`] when the message has no
    /// recipient or cannot be assembled.
    pub fn to_lettre(&self) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder().from(parse_mailbox("from", &self.from)?);

        for to in self.to.iter() {
            builder = builder.to(parse_mailbox("to", to)?);
        }
        for cc in self.cc.iter() {
            builder = builder.cc(parse_mailbox("cc", cc)?);
        }
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(parse_mailbox("replyTo", reply_to)?);
        }

        builder = builder.subject(self.subject.as_str());

        let build_err = |e: lettre::error::Error| DeliveryError::Build(e.to_string());

        if !self.attachments.is_empty() {
            let mut mixed = match &self.body {
                MessageBody::Alternative {
                    text,
                    html,
                    html_content_type,
                } => {
                    MultiPart::mixed().multipart(alternative_part(text, html, html_content_type)?)
                }
                single => MultiPart::mixed().singlepart(single.to_single_part()?),
            };
            for attachment in &self.attachments {
                mixed = mixed.singlepart(attachment.to_single_part()?);
            }
            return builder.multipart(mixed).map_err(build_err);
        }

        match &self.body {
            MessageBody::Alternative {
                text,
                html,
                html_content_type,
            } => builder
                .multipart(alternative_part(text, html, html_content_type)?)
                .map_err(build_err),
            MessageBody::Html {
                content,
                content_type,
            } => builder
                .header(parse_content_type(content_type)?)
                .body(content.clone())
                .map_err(build_err),
            MessageBody::Text(text) => builder
                .header(parse_content_type(TEXT_PLAIN_UTF8)?)
                .body(text.clone())
                .map_err(build_err),
            MessageBody::Empty => builder
                .header(parse_content_type(TEXT_PLAIN_UTF8)?)
                .body(String::new())
                .map_err(build_err),
        }
    }
}

fn plain_part(text: String) -> Result<SinglePart, DeliveryError> {
    Ok(SinglePart::builder()
        .header(parse_content_type(TEXT_PLAIN_UTF8)?)
        .body(text))
}

fn parse_content_type(value: &str) -> Result<ContentType, DeliveryError> {
    ContentType::parse(value)
        .map_err(|e| DeliveryError::Build(format!("invalid content type '{}': {}", value, e)))
}

fn parse_mailbox(field: &'static str, address: &str) -> Result<Mailbox, DeliveryError> {
    address.parse().map_err(|_| DeliveryError::InvalidAddress {
        field,
        address: address.to_string(),
    })
}
