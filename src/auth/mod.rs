//! Reader sessions
//!
//! Accounts live in Supabase Auth. The site only needs to know whether the
//! request carries a valid access token so the navbar can offer "Dashboard"
//! instead of "Log in". Any failure to reach Supabase degrades to an
//! anonymous visitor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{Cache, CacheLayer};
use crate::config::AuthConfig;

/// Session lookup errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected auth response status: {0}")]
    UnexpectedStatus(u16),
}

/// Signed-in reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves an access token to a reader
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` means the token is not (or no longer) valid
    async fn user_for_token(&self, token: &str) -> Result<Option<SessionUser>, AuthError>;
}

/// Provider used when no auth backend is configured
#[derive(Debug, Default)]
pub struct AnonymousSessions;

#[async_trait]
impl SessionProvider for AnonymousSessions {
    async fn user_for_token(&self, _token: &str) -> Result<Option<SessionUser>, AuthError> {
        Ok(None)
    }
}

/// Supabase Auth `GET /auth/v1/user`
pub struct SupabaseSessions {
    client: reqwest::Client,
    user_endpoint: String,
    anon_key: String,
}

impl SupabaseSessions {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            user_endpoint: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for SupabaseSessions {
    async fn user_for_token(&self, token: &str) -> Result<Option<SessionUser>, AuthError> {
        let response = self
            .client
            .get(&self.user_endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(Some(response.json::<SessionUser>().await?)),
            401 | 403 => Ok(None),
            other => Err(AuthError::UnexpectedStatus(other)),
        }
    }
}

/// Caches token lookups so one page view costs at most one Supabase call
pub struct SessionResolver {
    provider: Arc<dyn SessionProvider>,
    cache: Arc<Cache>,
    ttl: Duration,
}

impl SessionResolver {
    pub fn new(provider: Arc<dyn SessionProvider>, cache: Arc<Cache>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    /// Build from configuration; Supabase when configured, anonymous otherwise
    pub fn from_config(config: &AuthConfig, cache: Arc<Cache>) -> Result<Self, AuthError> {
        let provider: Arc<dyn SessionProvider> = match (&config.supabase_url, &config.supabase_anon_key) {
            (Some(url), Some(key)) if config.is_enabled() => {
                tracing::info!("Reader sessions validated against {}", url);
                Arc::new(SupabaseSessions::new(url, key)?)
            }
            _ => Arc::new(AnonymousSessions),
        };
        Ok(Self::new(
            provider,
            cache,
            Duration::from_secs(config.session_ttl_seconds),
        ))
    }

    /// Reader for `token`, or `None` for anonymous visitors
    pub async fn resolve(&self, token: &str) -> Option<SessionUser> {
        let key = format!("session:{}", token);

        if let Ok(Some(cached)) = self.cache.get::<Option<SessionUser>>(&key).await {
            return cached;
        }

        match self.provider.user_for_token(token).await {
            Ok(user) => {
                if let Err(e) = self.cache.set(&key, &user, self.ttl).await {
                    tracing::warn!("Failed to cache session lookup: {}", e);
                }
                user
            }
            Err(e) => {
                // Not cached, so the next request retries
                tracing::warn!("Session lookup failed, treating visitor as anonymous: {}", e);
                None
            }
        }
    }
}
