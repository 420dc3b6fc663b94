//! HTML body templating powered by minijinja.
//!
//! A configured template file is loaded and compiled once at configure time.
//! Each delivery renders it with the event's fields as the context:
//!
//! ```ignore
//! let renderer = TemplateRenderer::from_file(Path::new("alert.html"))?;
//! let html = renderer.render(&event)?;
//! ```
//!
//! Undefined variables are errors, so a template referencing a field the
//! event lacks fails the delivery instead of producing a half-empty email.

use crate::config::read_template_file;
use crate::error::{ConfigError, DeliveryError};
use crate::event::Event;
use minijinja::{Environment, UndefinedBehavior, Value};
use std::path::Path;

/// A compiled template producing HTML body content.
pub struct TemplateRenderer {
    env: Environment<'static>,
    name: String,
}

impl TemplateRenderer {
    /// Load and compile a template file.
    ///
    /// Auto-escaping follows the file extension (`.html`, `.htm` and `.xml`
    /// escape interpolated values).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] if the file cannot be read or
    /// does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = read_template_file(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_source(&name, source).map_err(|e| match e {
            ConfigError::InvalidTemplate { message, .. } => ConfigError::InvalidTemplate {
                name: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Compile a template from an in-memory source.
    pub fn from_source(name: &str, source: String) -> Result<Self, ConfigError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(name.to_string(), source)
            .map_err(|e| ConfigError::InvalidTemplate {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            env,
            name: name.to_string(),
        })
    }

    /// Template name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template against one event.
    pub fn render(&self, event: &Event) -> Result<String, DeliveryError> {
        tracing::trace!(template = %self.name, "Rendering template");

        let template = self
            .env
            .get_template(&self.name)
            .map_err(|e| DeliveryError::TemplateRender(e.to_string()))?;

        template
            .render(Value::from_serialize(event.fields()))
            .map_err(|e| DeliveryError::TemplateRender(format!("{}: {}", self.name, e)))
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_template(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn renders_event_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&dir, "alert.html", "<h1>{{message}}</h1>");

        let renderer = TemplateRenderer::from_file(&path).unwrap();
        let event = Event::new().with("message", "hello");

        assert_eq!(renderer.render(&event).unwrap(), "<h1>hello</h1>");
        assert_eq!(renderer.name(), "alert.html");
    }

    #[test]
    fn html_templates_escape_values() {
        let renderer =
            TemplateRenderer::from_source("alert.html", "<p>{{ message }}</p>".to_string())
                .unwrap();
        let event = Event::new().with("message", "<script>x</script>");

        let html = renderer.render(&event).unwrap();
        assert!(html.starts_with("<p>&lt;script&gt;x"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn non_html_templates_do_not_escape() {
        let renderer =
            TemplateRenderer::from_source("alert.txt", "{{ message }}".to_string()).unwrap();
        let event = Event::new().with("message", "<b>");
        assert_eq!(renderer.render(&event).unwrap(), "<b>");
    }

    #[test]
    fn supports_loops_and_nested_fields() {
        let renderer = TemplateRenderer::from_source(
            "list.html",
            "{% for h in hosts %}[{{ h }}]{% endfor %} {{ meta.dc }}".to_string(),
        )
        .unwrap();
        let event = Event::new()
            .with("hosts", json!(["a", "b"]))
            .with("meta", json!({"dc": "eu1"}));

        assert_eq!(renderer.render(&event).unwrap(), "[a][b] eu1");
    }

    #[test]
    fn missing_field_is_a_render_error() {
        let renderer =
            TemplateRenderer::from_source("alert.html", "<h1>{{ message }}</h1>".to_string())
                .unwrap();
        let err = renderer.render(&Event::new()).unwrap_err();
        assert!(matches!(err, DeliveryError::TemplateRender(_)));
        assert_eq!(err.kind(), "template");
    }

    #[test]
    fn syntax_error_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&dir, "broken.html", "<h1>{{ message </h1>");

        let err = TemplateRenderer::from_file(&path).unwrap_err();
        match err {
            ConfigError::InvalidTemplate { name, .. } => {
                assert!(name.ends_with("broken.html"));
            }
            e => panic!("Expected InvalidTemplate, got {:?}", e),
        }
    }

    #[test]
    fn missing_file_is_rejected_at_load() {
        let err = TemplateRenderer::from_file(Path::new("/nonexistent/alert.html")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
    }
}
