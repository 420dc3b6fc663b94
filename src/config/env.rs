//! Environment variable substitution and template file loading.

use crate::error::ConfigError;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Maximum size for a template file (1MB).
pub const MAX_TEMPLATE_FILE_SIZE: u64 = 1024 * 1024;

static ENV_VAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Resolves `${VAR_NAME}` patterns in a string.
///
/// All undefined variables are reported together in one error.
pub fn resolve_env_vars(value: &str) -> Result<String, ConfigError> {
    let mut missing = Vec::new();

    let result = ENV_VAR_REF.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(var_value) => var_value,
            Err(_) => {
                missing.push(var_name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(result.into_owned())
    } else {
        Err(ConfigError::ValidationError(format!(
            "undefined environment variable{}: {}",
            if missing.len() > 1 { "s" } else { "" },
            missing.join(", ")
        )))
    }
}

/// Reads a template file into memory.
///
/// Fails if the file is missing, larger than 1MB, or not valid UTF-8.
pub fn read_template_file(path: &Path) -> Result<String, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidTemplate {
        name: path.display().to_string(),
        message,
    };

    let metadata = std::fs::metadata(path).map_err(|e| invalid(format!("cannot read: {}", e)))?;

    if !metadata.is_file() {
        return Err(invalid("not a regular file".to_string()));
    }

    if metadata.len() > MAX_TEMPLATE_FILE_SIZE {
        return Err(invalid(format!(
            "exceeds maximum size of 1MB ({} bytes)",
            metadata.len()
        )));
    }

    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            invalid("must be valid UTF-8".to_string())
        } else {
            invalid(format!("cannot read: {}", e))
        }
    })
}
