//! Transport settings derived once from `via` and `transportOptions`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{SecretString, TransportOptions, resolve_env_vars};
use crate::error::ConfigError;

/// Default sendmail binary.
pub const DEFAULT_SENDMAIL_LOCATION: &str = "/usr/sbin/sendmail";

/// Default sendmail arguments: ignore lone dots, read recipients from headers.
pub const DEFAULT_SENDMAIL_ARGUMENTS: [&str; 2] = ["-i", "-t"];

/// Delivery settings, resolved at configure time and read-only afterwards.
#[derive(Debug, Clone)]
pub enum TransportSettings {
    Smtp(SmtpSettings),
    Sendmail(SendmailSettings),
    /// Any other `via` value, kept with its untouched options.
    Named {
        name: String,
        raw_options: TransportOptions,
    },
}

impl TransportSettings {
    /// Derive settings from the `via` name and its options.
    ///
    /// SMTP-specific options are ignored for sendmail and vice versa.
    /// `${VAR}` references in `userName` and `password` are resolved here.
    pub fn from_config(via: &str, options: &TransportOptions) -> Result<Self, ConfigError> {
        match via {
            "smtp" => SmtpSettings::from_options(options).map(TransportSettings::Smtp),
            "sendmail" => SendmailSettings::from_options(options).map(TransportSettings::Sendmail),
            other => Ok(TransportSettings::Named {
                name: other.to_string(),
                raw_options: options.clone(),
            }),
        }
    }

    /// Transport name used in logs and errors.
    pub fn kind(&self) -> &str {
        match self {
            TransportSettings::Smtp(_) => "smtp",
            TransportSettings::Sendmail(_) => "sendmail",
            TransportSettings::Named { name, .. } => name,
        }
    }
}

/// SMTP AUTH mechanism requested through `authenticationType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    Plain,
    Login,
    CramMd5,
}

impl FromStr for AuthenticationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(AuthenticationType::Plain),
            "login" => Ok(AuthenticationType::Login),
            "cram_md5" | "cram-md5" => Ok(AuthenticationType::CramMd5),
            other => Err(format!(
                "unknown authentication type '{}' (expected plain, login, cram_md5 or nil)",
                other
            )),
        }
    }
}

/// SMTP server settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub address: String,
    pub port: u16,
    /// Client name sent with EHLO.
    pub domain: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// `None` means no AUTH is attempted.
    pub authentication: Option<AuthenticationType>,
    /// Upgrade with STARTTLS when the server offers it.
    pub starttls: bool,
    pub debug: bool,
    /// Connection and command timeout; the client default applies when unset.
    pub timeout: Option<Duration>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 25,
            domain: "localhost".to_string(),
            username: None,
            password: None,
            authentication: None,
            starttls: false,
            debug: false,
            timeout: None,
        }
    }
}

impl SmtpSettings {
    fn from_options(options: &TransportOptions) -> Result<Self, ConfigError> {
        const SMTP: &str = "smtp";
        let defaults = SmtpSettings::default();

        let username = options
            .get_str(SMTP, "userName")?
            .map(|u| resolve_env_vars(&u))
            .transpose()
            .map_err(|e| option_error("userName", e))?;

        let password = options
            .get_str(SMTP, "password")?
            .map(|p| resolve_env_vars(&p))
            .transpose()
            .map_err(|e| option_error("password", e))?
            .map(SecretString::new);

        let authentication = match options.get_str(SMTP, "authenticationType")? {
            None => None,
            Some(value) if is_nil(&value) => None,
            Some(value) => Some(value.parse::<AuthenticationType>().map_err(|message| {
                ConfigError::InvalidOption {
                    transport: SMTP.to_string(),
                    option: "authenticationType".to_string(),
                    message,
                }
            })?),
        };

        Ok(Self {
            address: options.get_str(SMTP, "smtpIporHost")?.unwrap_or(defaults.address),
            port: options.get_port(SMTP, "port")?.unwrap_or(defaults.port),
            domain: options.get_str(SMTP, "domain")?.unwrap_or(defaults.domain),
            username,
            password,
            authentication,
            starttls: options.get_bool(SMTP, "starttls")?.unwrap_or(defaults.starttls),
            debug: options.get_bool(SMTP, "debug")?.unwrap_or(defaults.debug),
            timeout: options.get_u64(SMTP, "timeout")?.map(Duration::from_secs),
        })
    }
}

/// Local mail-transfer agent settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendmailSettings {
    pub location: PathBuf,
    pub arguments: Vec<String>,
}

impl Default for SendmailSettings {
    fn default() -> Self {
        Self {
            location: PathBuf::from(DEFAULT_SENDMAIL_LOCATION),
            arguments: DEFAULT_SENDMAIL_ARGUMENTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl SendmailSettings {
    fn from_options(options: &TransportOptions) -> Result<Self, ConfigError> {
        const SENDMAIL: &str = "sendmail";
        let defaults = SendmailSettings::default();

        Ok(Self {
            location: options
                .get_str(SENDMAIL, "location")?
                .map(PathBuf::from)
                .unwrap_or(defaults.location),
            arguments: options
                .get_words(SENDMAIL, "arguments")?
                .unwrap_or(defaults.arguments),
        })
    }
}

/// `nil`, `none` and the empty string all mean "no authentication".
fn is_nil(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "" | "nil" | "none" | "null")
}

fn option_error(option: &str, e: ConfigError) -> ConfigError {
    ConfigError::InvalidOption {
        transport: "smtp".to_string(),
        option: option.to_string(),
        message: e.to_string(),
    }
}
