//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "azuread.toml",
    "config.toml",
    "./config/azuread.toml",
    "/etc/azuread/config.toml",
];

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable source.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup)? {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An explicit path that does not exist is an error, not a fallthrough
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Ok(Some(path.clone()));
            }
            return Err(ConfigError::ValidationError(format!(
                "config file {} does not exist",
                path.display()
            )));
        }

        if let Some(path) = lookup("AZUREAD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }
}

/// Apply environment variable overrides
fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Directory connection (ARM_* names match the rest of the Azure tooling)
    if let Some(val) = lookup("ARM_TENANT_ID") {
        config.directory.tenant_id = val;
    }
    if let Some(val) = lookup("ARM_CLIENT_ID") {
        config.directory.client_id = val;
    }
    if let Some(val) = lookup("ARM_CLIENT_SECRET") {
        config.directory.client_secret = val;
    }
    if let Some(val) = lookup("ARM_ENVIRONMENT") {
        config.directory.environment = val;
    }
    if let Some(val) = lookup("AZUREAD_GRAPH_ENDPOINT") {
        config.directory.graph_endpoint = val;
    }
    if let Some(val) = lookup("AZUREAD_AUTHORITY_HOST") {
        config.directory.authority_host = val;
    }
    if let Some(val) = lookup("AZUREAD_TIMEOUT_SECS") {
        config.directory.timeout_secs = parse_env("AZUREAD_TIMEOUT_SECS", &val)?;
    }
    if let Some(val) = lookup("AZUREAD_RETRY_ATTEMPTS") {
        config.directory.retry_attempts = parse_env("AZUREAD_RETRY_ATTEMPTS", &val)?;
    }

    // Resolver
    if let Some(val) = lookup("AZUREAD_READ_TIMEOUT_SECS") {
        config.resolver.read_timeout_secs = parse_env("AZUREAD_READ_TIMEOUT_SECS", &val)?;
    }
    if let Some(val) = lookup("AZUREAD_MISSING_POLICY") {
        config.resolver.missing_policy = val.parse()?;
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{} has invalid value {:?}", key, val)))
}
