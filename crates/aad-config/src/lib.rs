//! AzureAD users configuration
//!
//! TOML-based configuration with environment variable overrides. Two sections:
//! `[directory]` for the connection to the directory service and `[resolver]`
//! for how a users read behaves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub directory: DirectoryConfig,
    pub resolver: ResolverConfig,
}

/// Connection to the directory service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Tenant (directory) id
    pub tenant_id: String,
    /// Application (client) id used for the client credentials grant
    pub client_id: String,
    /// Client secret used for the client credentials grant
    pub client_secret: String,
    /// Cloud environment: public, usgovernment, china, german
    pub environment: String,
    /// Graph endpoint override (empty = derived from environment)
    pub graph_endpoint: String,
    /// Authority host override (empty = derived from environment)
    pub authority_host: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per request, including the first
    pub retry_attempts: u32,
    /// Initial backoff between attempts in milliseconds
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            environment: "public".to_string(),
            graph_endpoint: String::new(),
            authority_host: String::new(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 100,
            user_agent: format!("aad-users/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DirectoryConfig {
    /// Graph endpoint without trailing slash.
    pub fn graph_endpoint(&self) -> Result<String, ConfigError> {
        let endpoint = if self.graph_endpoint.is_empty() {
            self.cloud()?.graph_endpoint().to_string()
        } else {
            self.graph_endpoint.clone()
        };
        Ok(endpoint.trim_end_matches('/').to_string())
    }

    /// Authority host without trailing slash.
    pub fn authority_host(&self) -> Result<String, ConfigError> {
        let host = if self.authority_host.is_empty() {
            self.cloud()?.authority_host().to_string()
        } else {
            self.authority_host.clone()
        };
        Ok(host.trim_end_matches('/').to_string())
    }

    pub fn cloud(&self) -> Result<CloudEnvironment, ConfigError> {
        self.environment.parse()
    }

    /// Checks that credentials and endpoints are usable for the HTTP client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("directory.tenant_id", &self.tenant_id),
            ("directory.client_id", &self.client_id),
            ("directory.client_secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} is required", name)));
            }
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "directory.retry_attempts must be at least 1".to_string(),
            ));
        }
        self.graph_endpoint()?;
        self.authority_host()?;
        Ok(())
    }
}

/// Known Azure clouds and their endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudEnvironment {
    Public,
    UsGovernment,
    China,
    German,
}

impl CloudEnvironment {
    pub fn graph_endpoint(&self) -> &'static str {
        match self {
            CloudEnvironment::Public | CloudEnvironment::UsGovernment => "https://graph.windows.net",
            CloudEnvironment::China => "https://graph.chinacloudapi.cn",
            CloudEnvironment::German => "https://graph.cloudapi.de",
        }
    }

    pub fn authority_host(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://login.microsoftonline.com",
            CloudEnvironment::UsGovernment => "https://login.microsoftonline.us",
            CloudEnvironment::China => "https://login.chinacloudapi.cn",
            CloudEnvironment::German => "https://login.microsoftonline.de",
        }
    }
}

impl FromStr for CloudEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" | "" => Ok(CloudEnvironment::Public),
            "usgovernment" => Ok(CloudEnvironment::UsGovernment),
            "china" => Ok(CloudEnvironment::China),
            "german" => Ok(CloudEnvironment::German),
            other => Err(ConfigError::ValidationError(format!(
                "unknown environment {:?} (expected public, usgovernment, china or german)",
                other
            ))),
        }
    }
}

/// What a read does with identifiers that resolve to nothing when
/// `ignore_missing` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingUserPolicy {
    /// Omit the missing user and keep looking up the rest.
    #[default]
    Skip,
    /// Stop at the first missing user; later identifiers are not looked up.
    StopAtFirstMiss,
}

impl FromStr for MissingUserPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(MissingUserPolicy::Skip),
            "stop_at_first_miss" => Ok(MissingUserPolicy::StopAtFirstMiss),
            other => Err(ConfigError::ValidationError(format!(
                "unknown missing policy {:?} (expected skip or stop_at_first_miss)",
                other
            ))),
        }
    }
}

impl fmt::Display for MissingUserPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingUserPolicy::Skip => write!(f, "skip"),
            MissingUserPolicy::StopAtFirstMiss => write!(f, "stop_at_first_miss"),
        }
    }
}

/// Users read behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub missing_policy: MissingUserPolicy,
    /// Upper bound for a whole read in seconds (0 = unbounded)
    pub read_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            missing_policy: MissingUserPolicy::Skip,
            read_timeout_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }
}
