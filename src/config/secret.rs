//! Secret string wrapper that never appears in logs.

/// Marker printed in place of any secret value.
pub const REDACTED: &str = "[REDACTED]";

/// Wrapper for secrets that never appears in logs.
///
/// Used for the SMTP password so that `TransportSettings` can be logged
/// with `?settings` at configure time. The `Debug` and `Display`
/// implementations always show `[REDACTED]` instead of the actual value.
///
/// # Example
///
/// ```
/// use mailout::config::SecretString;
///
/// let secret = SecretString::new("hunter2".to_string());
/// assert_eq!(format!("{:?}", secret), "[REDACTED]");
/// assert_eq!(secret.expose(), "hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new `SecretString` from a regular `String`.
    pub fn new(s: String) -> Self {
        SecretString(s)
    }

    /// Exposes the underlying secret value.
    ///
    /// Only the SMTP credential builder should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED)
    }
}
