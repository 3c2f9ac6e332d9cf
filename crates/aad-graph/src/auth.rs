//! App-only tokens for the directory API
//!
//! A [`TokenManager`] belongs to one tenant and requests tokens for the
//! `<graph endpoint>/.default` scope with the client credentials grant.
//! Tokens are reused until a minute before they expire.

use crate::error::{retry_after, GraphError, Result};
use aad_config::DirectoryConfig;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_LIFETIME_SECS: u64 = 3600;

#[derive(Deserialize)]
struct Grant {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Error document returned by the v2.0 token endpoint
#[derive(Deserialize)]
struct GrantError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn usable(&self) -> bool {
        self.expires_at > Instant::now() + EXPIRY_MARGIN
    }
}

pub struct TokenManager {
    token_url: String,
    scope: String,
    client_id: String,
    client_secret: String,
    http_client: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Token endpoint and scope are derived from the tenant, authority host
    /// and graph endpoint of `config`.
    pub fn from_config(config: &DirectoryConfig, http_client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                config.authority_host()?,
                config.tenant_id
            ),
            scope: format!("{}/.default", config.graph_endpoint()?),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            http_client,
            cached: RwLock::new(None),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Bearer token for the next request.
    ///
    /// A rejected grant (bad secret, unknown client) is an
    /// [`GraphError::Authentication`]; throttling and 5xx answers from the
    /// token endpoint come back as retryable errors.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached.read().await.as_ref().filter(|t| t.usable()) {
            return Ok(token.value.clone());
        }

        let mut cached = self.cached.write().await;
        // Lost the race to another request that already refreshed
        if let Some(token) = cached.as_ref().filter(|t| t.usable()) {
            return Ok(token.value.clone());
        }

        let grant = self.request_grant().await?;
        let lifetime = grant.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        debug!(lifetime, scope = %self.scope, "Acquired directory access token");

        *cached = Some(CachedToken {
            value: grant.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(grant.access_token)
    }

    /// Forget the cached token so the next request fetches a new one.
    pub async fn invalidate(&self) {
        self.cached.write().await.take();
    }

    async fn request_grant(&self) -> Result<Grant> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let wait = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, url = %self.token_url, "Token request rejected");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GraphError::RateLimited { retry_after: wait });
        }
        if status.is_server_error() {
            return Err(GraphError::Server(body));
        }
        Err(GraphError::Authentication(describe_rejection(status, &body)))
    }
}

/// `error: first line of error_description`, or the raw body when the
/// endpoint did not answer with an OAuth error document.
fn describe_rejection(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<GrantError>(body) {
        Ok(GrantError {
            error,
            error_description: Some(description),
        }) => {
            let summary = description.lines().next().unwrap_or_default().trim();
            format!("{}: {}", error, summary)
        }
        Ok(GrantError { error, .. }) => error,
        Err(_) => format!("token endpoint answered {}: {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_rejection_uses_oauth_error() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 1234\r\nCorrelation ID: 5678"}"#;
        assert_eq!(
            describe_rejection(StatusCode::UNAUTHORIZED, body),
            "invalid_client: AADSTS7000215: Invalid client secret provided."
        );
    }

    #[test]
    fn test_describe_rejection_without_description() {
        let body = r#"{"error":"unauthorized_client"}"#;
        assert_eq!(
            describe_rejection(StatusCode::BAD_REQUEST, body),
            "unauthorized_client"
        );
    }

    #[test]
    fn test_describe_rejection_plain_body() {
        let message = describe_rejection(StatusCode::BAD_REQUEST, "bad request");
        assert!(message.contains("400"));
        assert!(message.ends_with("bad request"));
    }

    #[test]
    fn test_from_config_derives_endpoint_and_scope() {
        let config = DirectoryConfig {
            tenant_id: "contoso".to_string(),
            client_id: "app".to_string(),
            client_secret: "secret".to_string(),
            graph_endpoint: "https://graph.example/".to_string(),
            authority_host: "https://login.example".to_string(),
            ..Default::default()
        };
        let manager = TokenManager::from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(manager.token_url(), "https://login.example/contoso/oauth2/v2.0/token");
        assert_eq!(manager.scope, "https://graph.example/.default");
    }
}
