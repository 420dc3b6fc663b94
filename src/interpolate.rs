//! `%{field}` interpolation of configuration strings against an event.
//!
//! Contract:
//! - `%{name}` is replaced by the event's value for `name`; `%{[a][b]}`
//!   addresses nested objects.
//! - A reference to a field that is absent from the event is left in place,
//!   unchanged (`%{missing}` stays `%{missing}`). A field present with a
//!   `null` value renders as the empty string.
//! - Arrays render as their elements joined with `,` (no spaces), so an
//!   address array survives the trip through `AddressList::parse`.
//! - Objects render as compact JSON.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

use crate::event::Event;

static FIELD_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\{([^{}]+)\}").expect("valid regex"));

/// Resolves every `%{name}` reference in `template` against `event`.
pub fn interpolate(template: &str, event: &Event) -> String {
    if !template.contains("%{") {
        return template.to_string();
    }

    FIELD_REF
        .replace_all(template, |caps: &Captures| match event.get(&caps[1]) {
            Some(value) => render_value(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Renders a single field value as text.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Turns two-character `\n` sequences into real line breaks.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> Event {
        Event::new()
            .with("message", "disk full")
            .with("host", "web-01")
            .with("count", 42)
            .with("ratio", 0.5)
            .with("ok", false)
            .with("nothing", Value::Null)
            .with("to_addr", json!(["email1@host", "email2@host"]))
            .with("meta", json!({"dc": "eu1"}))
    }

    #[test]
    fn replaces_string_fields() {
        assert_eq!(
            interpolate("[%{host}] %{message}", &event()),
            "[web-01] disk full"
        );
    }

    #[test]
    fn renders_scalars() {
        assert_eq!(interpolate("%{count}/%{ratio}/%{ok}", &event()), "42/0.5/false");
    }

    #[test]
    fn joins_arrays_with_commas() {
        assert_eq!(interpolate("%{to_addr}", &event()), "email1@host,email2@host");
    }

    #[test]
    fn renders_objects_as_json() {
        assert_eq!(interpolate("%{meta}", &event()), r#"{"dc":"eu1"}"#);
        assert_eq!(interpolate("%{[meta][dc]}", &event()), "eu1");
    }

    #[test]
    fn missing_field_left_unchanged() {
        assert_eq!(
            interpolate("alert for %{user} on %{host}", &event()),
            "alert for %{user} on web-01"
        );
    }

    #[test]
    fn null_field_renders_empty() {
        assert_eq!(interpolate("[%{nothing}]", &event()), "[]");
    }

    #[test]
    fn template_without_references_is_returned_verbatim() {
        assert_eq!(interpolate("plain text 100%", &event()), "plain text 100%");
        assert_eq!(interpolate("", &event()), "");
    }

    #[test]
    fn unclosed_reference_is_literal() {
        assert_eq!(interpolate("%{host", &event()), "%{host");
    }

    #[test]
    fn unescape_turns_literal_backslash_n_into_newlines() {
        assert_eq!(unescape_newlines("Line1\\nLine2\\nLine3"), "Line1\nLine2\nLine3");
        assert_eq!(unescape_newlines("no escapes"), "no escapes");
    }

    #[test]
    fn unescape_applies_after_interpolation() {
        let event = Event::new().with("detail", "a\\nb");
        let text = unescape_newlines(&interpolate("x\\n%{detail}", &event));
        assert_eq!(text, "x\na\nb");
    }
}
