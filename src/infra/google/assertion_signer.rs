use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::core::auth::{AssertionClaims, AssertionSigner, AuthError, Credentials, SignedAssertion};

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    /// Issuer (service account email).
    iss: String,

    /// Scope (what APIs we want access to).
    scope: String,

    /// Audience (token endpoint).
    aud: String,

    /// Issued at (Unix timestamp).
    iat: i64,

    /// Expiration (Unix timestamp, 1 hour from iat).
    exp: i64,
}

impl From<&AssertionClaims> for JwtClaims {
    fn from(claims: &AssertionClaims) -> Self {
        Self {
            iss: claims.issuer.clone(),
            scope: claims.scope.clone(),
            aud: claims.audience.clone(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        }
    }
}

/// Signs assertions with the service account's RSA key (RS256).
pub struct ServiceAccountSigner {
    credentials: Credentials,
}

impl ServiceAccountSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl AssertionSigner for ServiceAccountSigner {
    fn sign(&self, issued_at: DateTime<Utc>) -> Result<SignedAssertion, AuthError> {
        let claims = AssertionClaims::new(&self.credentials, issued_at);

        // Header::new sets typ = "JWT"
        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        let jwt = encode(&header, &JwtClaims::from(&claims), &key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(SignedAssertion::new(claims, jwt))
    }
}
