//! Command-line interface for mailout using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Sends one email per JSON event read from stdin or a file.
#[derive(Parser, Debug)]
#[command(name = "mailout")]
#[command(version)]
#[command(about = "Sends one email per JSON event over SMTP or sendmail")]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Validate configuration and exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Read events from this file instead of stdin (one JSON object per line).
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn cli_default_config_path() {
        let cli = Cli::try_parse_from(["mailout"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(cli.input.is_none());
    }

    #[test]
    fn cli_custom_config_path() {
        let cli = Cli::try_parse_from(["mailout", "-c", "/custom/path.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/custom/path.yaml"));

        let cli = Cli::try_parse_from(["mailout", "--config", "/long/path.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/long/path.yaml"));
    }

    #[test]
    fn cli_validate_flag() {
        let cli = Cli::try_parse_from(["mailout", "--validate"]).unwrap();
        assert!(cli.validate);
    }

    #[test]
    fn cli_input_option() {
        let cli = Cli::try_parse_from(["mailout", "-i", "events.jsonl"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("events.jsonl")));

        let cli = Cli::try_parse_from(["mailout", "--input", "/var/spool/events"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("/var/spool/events")));
    }

    #[test]
    fn cli_log_format_json() {
        let cli = Cli::try_parse_from(["mailout", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn cli_log_format_invalid_rejected() {
        let result = Cli::try_parse_from(["mailout", "--log-format", "invalid"]);
        assert!(result.is_err(), "Invalid log format should be rejected");
    }

    #[test]
    #[serial]
    fn cli_log_format_from_env() {
        temp_env::with_var("LOG_FORMAT", Some("json"), || {
            let cli = Cli::try_parse_from(["mailout"]).unwrap();
            assert!(matches!(cli.log_format, LogFormat::Json));
        });
    }

    #[test]
    #[serial]
    fn cli_log_format_flag_overrides_env() {
        temp_env::with_var("LOG_FORMAT", Some("json"), || {
            let cli = Cli::try_parse_from(["mailout", "--log-format", "text"]).unwrap();
            assert!(matches!(cli.log_format, LogFormat::Text));
        });
    }

    #[test]
    #[serial]
    fn cli_log_format_default() {
        temp_env::with_var("LOG_FORMAT", None::<&str>, || {
            let cli = Cli::try_parse_from(["mailout"]).unwrap();
            assert!(matches!(cli.log_format, LogFormat::Text));
        });
    }
}
