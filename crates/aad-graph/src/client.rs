//! HTTP directory client for the Azure AD Graph API

use crate::auth::TokenManager;
use crate::directory::DirectoryClient;
use crate::error::{retry_after, GraphError, Result};
use crate::user::{User, UserPage};
use aad_config::DirectoryConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const API_VERSION: &str = "1.6";

/// Directory client backed by the Graph REST API.
///
/// Requests carry a client-credentials bearer token. Rate limiting and
/// server errors are retried with exponential backoff; a 401 drops the
/// cached token and retries once with a fresh one.
#[derive(Debug, Clone)]
pub struct GraphClient {
    graph_endpoint: String,
    tenant_id: String,
    http_client: reqwest::Client,
    tokens: Arc<TokenManager>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl GraphClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        let tokens = TokenManager::from_config(config, http_client.clone())?;

        Ok(Self {
            graph_endpoint: config.graph_endpoint()?,
            tenant_id: config.tenant_id.clone(),
            http_client,
            tokens: Arc::new(tokens),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn tenant_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.graph_endpoint, self.tenant_id, path)
    }

    /// GET a JSON document with auth, retries and error mapping.
    ///
    /// `retry_attempts` bounds the number of sends. The single token
    /// refresh after a 401 is not counted as one of them.
    async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let mut refreshed = false;
        let mut delay: Option<Duration> = None;
        let mut last_error = None;

        while attempt < self.retry_attempts {
            if let Some(wait) = delay.take() {
                tokio::time::sleep(wait).await;
            }

            let token = match self.tokens.access_token().await {
                Ok(token) => token,
                Err(e) if e.is_retryable() || matches!(e, GraphError::Http(_)) => {
                    warn!(url = %self.tokens.token_url(), attempt, error = %e, "Token request failed");
                    delay = Some(self.wait_for(&e, attempt));
                    last_error = Some(e);
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            debug!(url = %url, attempt, "Directory request");

            let response = match self
                .http_client
                .get(url)
                .query(&[("api-version", API_VERSION)])
                .query(query)
                .bearer_auth(token)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "Directory request failed");
                    delay = Some(self.backoff(attempt));
                    last_error = Some(GraphError::Http(e));
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response.json().await?);
            }

            if status == StatusCode::UNAUTHORIZED && !refreshed {
                debug!(url = %url, "Access token rejected, refreshing");
                self.tokens.invalidate().await;
                refreshed = true;
                continue;
            }

            let wait = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            let error = match GraphError::from_status(status, body) {
                GraphError::RateLimited { .. } => GraphError::RateLimited { retry_after: wait },
                other => other,
            };
            if !error.is_retryable() {
                return Err(error);
            }

            warn!(url = %url, attempt, status = %status, "Retryable directory response");
            delay = Some(self.wait_for(&error, attempt));
            last_error = Some(error);
            attempt += 1;
        }

        Err(last_error.unwrap_or_else(|| GraphError::Other("Request failed".into())))
    }

    /// Server-supplied `Retry-After` wins over the computed backoff.
    fn wait_for(&self, error: &GraphError, attempt: u32) -> Duration {
        match error {
            GraphError::RateLimited {
                retry_after: Some(wait),
            } => *wait,
            _ => self.backoff(attempt),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * (1u32 << attempt.min(16))
    }

    /// Walk every page of a filtered user listing until `pick` matches.
    async fn find_user<F>(&self, filter: &str, pick: F) -> Result<Option<User>>
    where
        F: Fn(&User) -> bool,
    {
        let mut page: UserPage = self
            .get_json(&self.tenant_url("users"), &[("$filter", filter)])
            .await?;

        loop {
            if let Some(user) = page.value.into_iter().find(|u| pick(u)) {
                return Ok(Some(user));
            }

            let next = match page.next_link {
                Some(link) if !link.is_empty() => link,
                _ => return Ok(None),
            };
            let url = if next.starts_with("http://") || next.starts_with("https://") {
                next
            } else {
                self.tenant_url(&next)
            };
            page = self.get_json(&url, &[]).await?;
        }
    }
}

/// Quote a value as an OData string literal.
pub(crate) fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait]
impl DirectoryClient for GraphClient {
    async fn get_by_principal_name(&self, upn: &str) -> Result<User> {
        let url = self.tenant_url(&format!("users/{}", urlencoding::encode(upn)));
        self.get_json(&url, &[]).await
    }

    async fn get_by_object_id(&self, object_id: &str) -> Result<User> {
        let filter = format!("objectId eq {}", odata_literal(object_id));
        self.find_user(&filter, |u| {
            u.object_id
                .as_deref()
                .is_some_and(|id| id.eq_ignore_ascii_case(object_id))
        })
        .await?
        .ok_or_else(|| GraphError::NotFound(format!("user with object ID {:?}", object_id)))
    }

    async fn get_by_mail_nickname(&self, mail_nickname: &str) -> Result<User> {
        let filter = format!("startswith(mailNickname,{})", odata_literal(mail_nickname));
        self.find_user(&filter, |u| u.mail_nickname.as_deref() == Some(mail_nickname))
            .await?
            .ok_or_else(|| {
                GraphError::NotFound(format!("user with mail nickname {:?}", mail_nickname))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odata_literal_escapes_quotes() {
        assert_eq!(odata_literal("alice"), "'alice'");
        assert_eq!(odata_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = GraphClient::new(&DirectoryConfig::default()).unwrap_err();
        assert!(matches!(err, GraphError::Config(_)));
    }

    #[test]
    fn test_tenant_url() {
        let config = DirectoryConfig {
            tenant_id: "contoso".into(),
            client_id: "app".into(),
            client_secret: "secret".into(),
            ..Default::default()
        };
        let client = GraphClient::new(&config).unwrap();
        assert_eq!(
            client.tenant_url("users"),
            "https://graph.windows.net/contoso/users"
        );
    }
}
