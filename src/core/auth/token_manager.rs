// Access token cache for the service account.
// This module knows nothing about HTTP or RSA: signing and the token endpoint
// are injected through the traits below, so the refresh logic can be
// exercised with fakes and a manual clock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::auth_models::{AuthError, SignedAssertion, TokenGrant};

// ============================================================================
// SEAMS
// ============================================================================

/// Source of "now". Staleness is always evaluated against this.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds and signs the assertion for one exchange attempt.
pub trait AssertionSigner: Send + Sync {
    fn sign(&self, issued_at: DateTime<Utc>) -> Result<SignedAssertion, AuthError>;
}

/// Trades a signed assertion for an access token at the token endpoint.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, assertion: &SignedAssertion) -> Result<TokenGrant, AuthError>;
}

/// Anything that can hand out a currently valid bearer token.
/// The spreadsheet layer only depends on this.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_token(&self) -> Result<String, AuthError>;
}

// ============================================================================
// TOKEN MANAGER
// ============================================================================

/// Cached access token with its absolute expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Hands out access tokens, refreshing them lazily when they go stale.
///
/// Refreshes are single-flight: the refresh gate is held across signing and
/// the network exchange, and callers that queued behind it re-check the
/// cache before doing any work of their own. The fast path (a valid token
/// is cached) only takes a shared read lock.
pub struct TokenManager<S: AssertionSigner, E: TokenExchange> {
    signer: S,
    exchange: E,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<CachedToken>>,
    refresh_gate: Mutex<()>,
}

impl<S: AssertionSigner, E: TokenExchange> TokenManager<S, E> {
    pub fn new(signer: S, exchange: E) -> Self {
        Self::with_clock(signer, exchange, Arc::new(SystemClock))
    }

    pub fn with_clock(signer: S, exchange: E, clock: Arc<dyn Clock>) -> Self {
        Self {
            signer,
            exchange,
            clock,
            cached: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Returns a valid bearer token, refreshing first if the cached one is
    /// missing or expired. On failure the previous cache is left untouched.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_if_valid().await {
            return Ok(token);
        }

        let _gate = self.refresh_gate.lock().await;

        // Somebody else may have refreshed while we were queued on the gate
        if let Some(token) = self.cached_if_valid().await {
            tracing::debug!("Access token refreshed by a concurrent caller");
            return Ok(token);
        }

        tracing::debug!("Access token expired or not available, refreshing");
        match self.refresh().await {
            Ok(token) => {
                tracing::debug!("Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::error!(
                    transient = e.is_transient(),
                    "Failed to refresh access token: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Expiry of the cached token, if there is one.
    #[cfg(test)]
    async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.cached.read().await.as_ref().map(|t| t.expires_at)
    }

    async fn cached_if_valid(&self) -> Option<String> {
        let now = self.clock.now();
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|t| t.is_valid_at(now))
            .map(|t| t.value.clone())
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        let assertion = self.signer.sign(self.clock.now())?;
        let grant = self.exchange.exchange(&assertion).await?;

        if grant.expires_in <= 0 {
            return Err(AuthError::MalformedResponse("expires_in".to_string()));
        }

        // Lifetimes too large for a timestamp are as unusable as negative ones
        let expires_at = Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::MalformedResponse("expires_in".to_string()))?;
        let mut cached = self.cached.write().await;
        *cached = Some(CachedToken {
            value: grant.access_token.clone(),
            expires_at,
        });

        Ok(grant.access_token)
    }
}

#[async_trait]
impl<S: AssertionSigner, E: TokenExchange> TokenSource for TokenManager<S, E> {
    async fn get_token(&self) -> Result<String, AuthError> {
        TokenManager::get_token(self).await
    }
}
