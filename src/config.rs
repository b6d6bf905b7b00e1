// Runtime configuration, read from environment variables (a `.env` file is
// loaded first by main.rs if present).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CREDENTIALS_FILE: &str = "gcp_credentials.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} not found")]
    MissingVar(&'static str),
    #[error("environment variable {name} has an invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Where the service account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    File(PathBuf),
    /// Raw key JSON, for deployments that can't ship a file.
    Inline(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spreadsheet_id: String,
    pub credentials: CredentialsSource,
    pub http_timeout: Duration,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let spreadsheet_id = get("SPREADSHEET_ID").ok_or(ConfigError::MissingVar("SPREADSHEET_ID"))?;

        let credentials = match get("GOOGLE_SERVICE_ACCOUNT_JSON") {
            Some(json) => CredentialsSource::Inline(json),
            None => CredentialsSource::File(PathBuf::from(
                get("GCP_CREDENTIALS_FILE").unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string()),
            )),
        };

        let http_timeout = match get("SHEETS_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "SHEETS_HTTP_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            spreadsheet_id,
            credentials,
            http_timeout,
            log_level,
        })
    }
}
