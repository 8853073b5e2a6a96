//! Process configuration loaded from environment variables.
//!
//! Each binary loads only the sections it needs. A `.env` file is honoured
//! through `dotenvy` before any of these are read.
//!
//! | Variable               | Used by | Required | Default                  |
//! |------------------------|---------|----------|--------------------------|
//! | `PETKIT_USERNAME`      | both    | yes      | --                       |
//! | `PETKIT_PASSWORD`      | both    | yes      | --                       |
//! | `PETKIT_API_URL`       | both    | no       | `http://api.petkt.com`   |
//! | `HTTP_TIMEOUT_SECS`    | both    | no       | `30`                     |
//! | `SPREADSHEET_ID`       | export  | yes      | --                       |
//! | `AUTH_JSON`            | export  | yes      | --                       |
//! | `EXPORT_LOOKBACK_DAYS` | export  | no       | `0`                      |
//! | `IFTTT_KEY`            | notify  | yes      | --                       |
//! | `IFTTT_EVENT`          | notify  | no       | `litter_box_is_full`     |
//! | `IFTTT_URL`            | notify  | no       | `https://maker.ifttt.com`|

use std::time::Duration;

use petkit_client::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use petkit_client::Credentials;
use petkit_events::delivery::webhook::{DEFAULT_TRIGGER_EVENT, DEFAULT_WEBHOOK_URL};

/// Configuration errors, naming the offending variable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}': expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Source of configuration values; the process environment in production.
pub trait VarSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`.
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

fn required(vars: &impl VarSource, name: &'static str) -> Result<String, ConfigError> {
    vars.var(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed_or<T: std::str::FromStr>(
    vars: &impl VarSource,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match vars.var(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
        None => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Vendor
// ---------------------------------------------------------------------------

/// Vendor account and HTTP settings.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub credentials: Credentials,
    pub api_url: String,
    pub timeout: Duration,
}

impl VendorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&ProcessEnv)
    }

    pub fn from_vars(vars: &impl VarSource) -> Result<Self, ConfigError> {
        let username = required(vars, "PETKIT_USERNAME")?;
        let password = required(vars, "PETKIT_PASSWORD")?;
        let timeout_secs = parsed_or(
            vars,
            "HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT.as_secs(),
            "a whole number of seconds",
        )?;

        Ok(Self {
            credentials: Credentials::new(username, &password),
            api_url: vars
                .var("PETKIT_API_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Destination spreadsheet settings.
#[derive(Clone)]
pub struct ExportConfig {
    pub spreadsheet_id: String,
    /// Service-account key JSON, kept out of `Debug` output.
    pub auth_json: String,
    pub lookback_days: u32,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("lookback_days", &self.lookback_days)
            .finish_non_exhaustive()
    }
}

impl ExportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&ProcessEnv)
    }

    pub fn from_vars(vars: &impl VarSource) -> Result<Self, ConfigError> {
        Ok(Self {
            spreadsheet_id: required(vars, "SPREADSHEET_ID")?,
            auth_json: required(vars, "AUTH_JSON")?,
            lookback_days: parsed_or(vars, "EXPORT_LOOKBACK_DAYS", 0, "a number of days")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Notify
// ---------------------------------------------------------------------------

/// Webhook trigger settings.
#[derive(Clone)]
pub struct NotifyConfig {
    pub webhook_key: String,
    pub trigger_event: String,
    pub webhook_url: String,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("trigger_event", &self.trigger_event)
            .field("webhook_url", &self.webhook_url)
            .finish_non_exhaustive()
    }
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&ProcessEnv)
    }

    pub fn from_vars(vars: &impl VarSource) -> Result<Self, ConfigError> {
        Ok(Self {
            webhook_key: required(vars, "IFTTT_KEY")?,
            trigger_event: vars
                .var("IFTTT_EVENT")
                .unwrap_or_else(|| DEFAULT_TRIGGER_EVENT.to_string()),
            webhook_url: vars
                .var("IFTTT_URL")
                .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
