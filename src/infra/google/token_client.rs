use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::auth::auth_models::JWT_BEARER_GRANT_TYPE;
use crate::core::auth::{AuthError, SignedAssertion, TokenExchange, TokenGrant};

/// Exchanges signed assertions at Google's OAuth2 token endpoint.
pub struct GoogleTokenClient {
    client: Client,
    token_uri: String,
}

impl GoogleTokenClient {
    /// `client` should carry a request timeout; see `infra::google::http_client`.
    pub fn new(client: Client, token_uri: impl Into<String>) -> Self {
        Self {
            client,
            token_uri: token_uri.into(),
        }
    }
}

#[async_trait]
impl TokenExchange for GoogleTokenClient {
    async fn exchange(&self, assertion: &SignedAssertion) -> Result<TokenGrant, AuthError> {
        tracing::debug!(
            issuer = %assertion.claims.issuer,
            expires_at = %assertion.claims.expires_at,
            "Exchanging signed assertion for an access token"
        );
        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        parse_token_response(&body)
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Network(e.to_string())
    }
}

/// Pulls `access_token` and `expires_in` out of a token endpoint response.
/// `expires_in` may arrive as a number or as a numeric string.
fn parse_token_response(body: &str) -> Result<TokenGrant, AuthError> {
    let json: Value = serde_json::from_str(body).map_err(|e| AuthError::Decode(e.to_string()))?;

    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::error!("Token response is missing access_token");
            AuthError::MalformedResponse("access_token".to_string())
        })?
        .to_string();

    let expires_in = match json.get("expires_in") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AuthError::MalformedResponse("expires_in".to_string()))?;

    Ok(TokenGrant {
        access_token,
        expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::auth_models::TOKEN_URL;
    use crate::core::auth::{AssertionClaims, Credentials};
    use crate::infra::google::http_client;
    use crate::infra::google::test_server::serve_once;
    use chrono::Utc;
    use std::time::Duration;

    fn assertion() -> SignedAssertion {
        let credentials = Credentials {
            private_key: "unused".to_string(),
            client_email: "bot@course-bot.iam.gserviceaccount.com".to_string(),
            token_uri: TOKEN_URL.to_string(),
        };
        SignedAssertion::new(
            AssertionClaims::new(&credentials, Utc::now()),
            "header.claims.signature".to_string(),
        )
    }

    fn client(base: &str, timeout: Duration) -> GoogleTokenClient {
        GoogleTokenClient::new(http_client(timeout).unwrap(), format!("{}/token", base))
    }

    #[test]
    fn test_parse_token_response() {
        let grant = parse_token_response(
            r#"{"access_token": "ya29.abc", "expires_in": 3599, "token_type": "Bearer"}"#,
        )
        .unwrap();

        assert_eq!(
            grant,
            TokenGrant {
                access_token: "ya29.abc".to_string(),
                expires_in: 3599,
            }
        );
    }

    #[test]
    fn test_expires_in_as_string() {
        let grant =
            parse_token_response(r#"{"access_token": "ya29.abc", "expires_in": "3600"}"#).unwrap();
        assert_eq!(grant.expires_in, 3600);
    }

    #[test]
    fn test_missing_access_token() {
        let err = parse_token_response(r#"{"expires_in": 3600}"#).unwrap_err();
        assert!(matches!(err, AuthError::MalformedResponse(ref field) if field == "access_token"));
    }

    #[test]
    fn test_non_numeric_expires_in() {
        let err = parse_token_response(r#"{"access_token": "ya29.abc", "expires_in": "soon"}"#)
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedResponse(ref field) if field == "expires_in"));
    }

    #[test]
    fn test_body_that_is_not_json() {
        let err = parse_token_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, AuthError::Decode(_)));
    }

    #[tokio::test]
    async fn test_exchange_posts_jwt_bearer_form() {
        let (base, request) = serve_once(
            200,
            r#"{"access_token": "ya29.live", "expires_in": 3599}"#,
            Duration::ZERO,
        )
        .await;

        let grant = client(&base, Duration::from_secs(5))
            .exchange(&assertion())
            .await
            .unwrap();
        assert_eq!(grant.access_token, "ya29.live");
        assert_eq!(grant.expires_in, 3599);

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /token HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));
        assert!(request.contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer&assertion=header.claims.signature"
        ));
    }

    #[tokio::test]
    async fn test_rejected_exchange_keeps_status_and_body() {
        let (base, _request) = serve_once(
            400,
            r#"{"error": "invalid_grant"}"#,
            Duration::ZERO,
        )
        .await;

        let err = client(&base, Duration::from_secs(5))
            .exchange(&assertion())
            .await
            .unwrap_err();
        match err {
            AuthError::TokenExchange { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_token_endpoint_times_out() {
        let (base, _request) = serve_once(200, "{}", Duration::from_secs(5)).await;

        let err = client(&base, Duration::from_millis(100))
            .exchange(&assertion())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Timeout));
        assert!(err.is_transient());
    }
}
