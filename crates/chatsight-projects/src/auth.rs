// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential providers for the project-configuration service.
//!
//! Tokens are supplied through the [`TokenProvider`] seam instead of a
//! process-global credential. Two implementations: a static configured
//! token, and a refreshing provider that fetches from a token endpoint and
//! caches the result until it is within the expiry margin.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chatsight_config::model::ProjectsConfig;
use chatsight_core::{ChatsightError, TokenProvider};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

/// A fixed bearer token from configuration. No refresh lifecycle.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, ChatsightError> {
        Ok(self.token.clone())
    }
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    /// Seconds until the token expires.
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Fetches bearer tokens from a token endpoint and caches them.
///
/// A cached token counts as stale once it is within `refresh_margin` of
/// its expiry; the next call fetches a fresh one. Concurrent callers
/// during a refresh may each fetch -- the endpoint must tolerate that, and
/// the last writer wins the cache slot.
pub struct RefreshingToken {
    client: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
    cached: RwLock<Option<CachedToken>>,
}

impl RefreshingToken {
    pub fn new(
        auth_url: String,
        client_id: String,
        client_secret: String,
        refresh_margin: Duration,
    ) -> Result<Self, ChatsightError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatsightError::Resolver {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            auth_url,
            client_id,
            client_secret,
            refresh_margin,
            cached: RwLock::new(None),
        })
    }

    async fn fetch_token(&self) -> Result<CachedToken, ChatsightError> {
        let response = self
            .client
            .post(&self.auth_url)
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
            }))
            .send()
            .await
            .map_err(|e| ChatsightError::Resolver {
                message: format!("token request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatsightError::Resolver {
                message: format!("token endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| ChatsightError::Resolver {
                message: format!("failed to parse token response: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(expires_in = token_response.expires_in, "bearer token refreshed");
        Ok(CachedToken {
            token: token_response.token,
            expires_at: Instant::now() + Duration::from_secs(token_response.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for RefreshingToken {
    async fn bearer_token(&self) -> Result<String, ChatsightError> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref()
                && entry.expires_at.saturating_duration_since(Instant::now()) > self.refresh_margin
            {
                return Ok(entry.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *self.cached.write().await = Some(fresh);
        Ok(token)
    }
}

/// Builds the credential provider described by the configuration.
///
/// A configured static token wins; otherwise the auth triple selects the
/// refreshing provider. With neither, project resolution cannot run.
pub fn token_provider_from_config(
    config: &ProjectsConfig,
) -> Result<Arc<dyn TokenProvider>, ChatsightError> {
    if let Some(token) = &config.token {
        return Ok(Arc::new(StaticToken::new(token.clone())));
    }
    match (&config.auth_url, &config.client_id, &config.client_secret) {
        (Some(auth_url), Some(client_id), Some(client_secret)) => {
            Ok(Arc::new(RefreshingToken::new(
                auth_url.clone(),
                client_id.clone(),
                client_secret.clone(),
                Duration::from_secs(config.refresh_margin_secs),
            )?))
        }
        _ => Err(ChatsightError::Config(
            "projects requires either `token` or the auth_url/client_id/client_secret triple"
                .to_string(),
        )),
    }
}
