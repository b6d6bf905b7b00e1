use chrono::{DateTime, Duration, Utc};
use std::fmt;
use thiserror::Error;

/// Google's OAuth2 token endpoint. Also the `aud` claim of every assertion.
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope requested for every token: read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Grant type for exchanging a signed assertion for an access token.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// How long a signed assertion stays valid after it is issued (1 hour, the
/// maximum Google accepts).
pub const ASSERTION_LIFETIME_SECS: i64 = 60 * 60;

/// Service account key material loaded from the JSON key file.
#[derive(Clone)]
pub struct Credentials {
    /// PEM encoded RSA private key.
    pub private_key: String,
    /// Service account email, used as the assertion issuer.
    pub client_email: String,
    /// Where assertions are exchanged for access tokens.
    pub token_uri: String,
}

// Hand-written so the private key never ends up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Claims carried by a signed assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionClaims {
    pub issuer: String,
    pub scope: String,
    pub audience: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AssertionClaims {
    /// Builds the claim set for an assertion issued at `issued_at`.
    /// The expiry is always `issued_at + 1 hour`.
    pub fn new(credentials: &Credentials, issued_at: DateTime<Utc>) -> Self {
        Self {
            issuer: credentials.client_email.clone(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            audience: credentials.token_uri.clone(),
            issued_at,
            expires_at: issued_at + Duration::seconds(ASSERTION_LIFETIME_SECS),
        }
    }
}

/// A signed, time-bounded assertion ready to be exchanged.
/// Created fresh for every exchange attempt and never reused.
#[derive(Debug, Clone)]
pub struct SignedAssertion {
    pub claims: AssertionClaims,
    encoded: String,
}

impl SignedAssertion {
    pub fn new(claims: AssertionClaims, encoded: String) -> Self {
        Self { claims, encoded }
    }

    /// The compact serialized form sent to the token endpoint.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

/// What the token endpoint hands back after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds, relative to the moment of the response.
    pub expires_in: i64,
}

/// Errors raised while loading service account credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("credentials file not found: {0}")]
    NotFound(String),
    #[error("failed to read credentials file {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("credentials are not valid JSON: {0}")]
    InvalidJson(String),
    #[error("credentials are missing required field `{0}`")]
    MissingField(&'static str),
}

/// Errors raised while acquiring an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to sign token assertion: {0}")]
    Signing(String),
    #[error("token endpoint returned {status}: {body}")]
    TokenExchange { status: u16, body: String },
    #[error("token endpoint response is missing or has an invalid `{0}`")]
    MalformedResponse(String),
    #[error("could not decode token endpoint response: {0}")]
    Decode(String),
    #[error("network error talking to token endpoint: {0}")]
    Network(String),
    #[error("token request timed out")]
    Timeout,
}

impl AuthError {
    /// True for failures that may go away on their own (network trouble,
    /// timeouts). Signing and response-shape errors need a config fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::Timeout)
    }
}
