// Loads service account key material from the JSON key file downloaded from
// the Google Cloud Console. Only `private_key` and `client_email` are
// required; `token_uri` falls back to Google's public token endpoint.
//
// Nothing in here logs the private key.

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

use crate::core::auth::auth_models::TOKEN_URL;
use crate::core::auth::{Credentials, CredentialsError};

/// The fields we care about from the key file. Everything is optional here
/// so a missing field can be reported by name instead of as a parse error.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    private_key: Option<String>,
    client_email: Option<String>,
    token_uri: Option<String>,
}

/// Reads and validates the key file at `path`.
pub async fn load(path: impl AsRef<Path>) -> Result<Credentials, CredentialsError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => CredentialsError::NotFound(path.display().to_string()),
            _ => CredentialsError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;

    let credentials = from_json(&content)?;
    tracing::info!(
        client_email = %credentials.client_email,
        "Loaded service account credentials from {}",
        path.display()
    );
    Ok(credentials)
}

/// Validates key material given directly as JSON (e.g. from an env var).
pub fn from_json(json: &str) -> Result<Credentials, CredentialsError> {
    let key: ServiceAccountKey =
        serde_json::from_str(json).map_err(|e| CredentialsError::InvalidJson(e.to_string()))?;

    let private_key = required(key.private_key, "private_key")?;
    let client_email = required(key.client_email, "client_email")?;
    let token_uri = key
        .token_uri
        .filter(|uri| !uri.trim().is_empty())
        .unwrap_or_else(|| TOKEN_URL.to_string());

    Ok(Credentials {
        private_key,
        client_email,
        token_uri,
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, CredentialsError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(CredentialsError::MissingField(field))
}
