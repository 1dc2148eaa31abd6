//! Client-credentials bearer tokens for Resource Manager
//!
//! Tokens are fetched on first use and reused until shortly before expiry.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AzureError;

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Acquires and caches bearer tokens for one service principal
pub struct Authorizer {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: Mutex<Option<CachedToken>>,
}

impl Authorizer {
    /// Create an authorizer for the given tenant and Resource Manager audience
    pub fn new(
        http: reqwest::Client,
        authority_host: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        arm_endpoint: &str,
    ) -> Self {
        Self {
            http,
            token_url: token_url(authority_host, tenant_id),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: format!("{}/.default", arm_endpoint.trim_end_matches('/')),
            cache: Mutex::new(None),
        }
    }

    /// A valid bearer token, fetching a new one when the cached one is stale
    pub async fn bearer(&self) -> Result<String, AzureError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        debug!(token_url = %self.token_url, "requesting access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AzureError::Token(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AzureError::Token(e.to_string()))?;
        if !status.is_success() {
            return Err(AzureError::Token(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AzureError::Token(e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cache = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

fn token_url(authority_host: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host.trim_end_matches('/'),
        tenant_id
    )
}
