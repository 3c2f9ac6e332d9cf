//! AzureAD users reader
//!
//! Resolves users by object id, principal name or mail nickname and writes
//! the aggregate (ids, flattened users, identity) as JSON.
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `AZUREAD_CONFIG` | Config file path |
//! | `ARM_TENANT_ID` | Tenant id |
//! | `ARM_CLIENT_ID` | Application (client) id |
//! | `ARM_CLIENT_SECRET` | Client secret |
//! | `ARM_ENVIRONMENT` | public, usgovernment, china, german |
//! | `AZUREAD_MISSING_POLICY` | skip, stop_at_first_miss |
//! | `LOG_FORMAT` | `json` for JSON logs |
//! | `RUST_LOG` | Log level (default `info`) |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use aad_config::{ConfigLoader, MissingUserPolicy};
use aad_graph::{DirectoryClient, GraphClient, InMemoryDirectory};
use aad_users::{JsonFileSink, StdoutSink, UsersQuery, UsersResolver};

#[derive(Parser, Debug)]
#[command(name = "aad-users")]
#[command(about = "Read AzureAD users by object id, principal name or mail nickname")]
struct Args {
    /// Config file (TOML)
    #[arg(long, env = "AZUREAD_CONFIG")]
    config: Option<PathBuf>,

    /// Object id to look up (repeatable)
    #[arg(long = "object-id", value_name = "UUID")]
    object_ids: Vec<String>,

    /// User principal name to look up (repeatable)
    #[arg(long = "upn", value_name = "NAME")]
    user_principal_names: Vec<String>,

    /// Mail nickname to look up (repeatable)
    #[arg(long = "mail-nickname", value_name = "ALIAS")]
    mail_nicknames: Vec<String>,

    /// Read the query from a JSON file instead of the flags above
    #[arg(long, value_name = "FILE", conflicts_with_all = ["object_ids", "user_principal_names", "mail_nicknames"])]
    query: Option<PathBuf>,

    /// Tolerate identifiers that resolve to no user
    #[arg(long)]
    ignore_missing: bool,

    /// skip or stop_at_first_miss (overrides config)
    #[arg(long, value_name = "POLICY")]
    missing_policy: Option<MissingUserPolicy>,

    /// Write the result to this state file instead of stdout
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Resolve against users from a JSON file instead of the directory API
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,
}

impl Args {
    fn users_query(&self) -> Result<UsersQuery> {
        if let Some(path) = &self.query {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading query file {}", path.display()))?;
            let mut query: UsersQuery = serde_json::from_str(&content)
                .with_context(|| format!("parsing query file {}", path.display()))?;
            query.ignore_missing |= self.ignore_missing;
            return Ok(query);
        }

        let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        Ok(UsersQuery {
            object_ids: non_empty(&self.object_ids),
            user_principal_names: non_empty(&self.user_principal_names),
            mail_nicknames: non_empty(&self.mail_nicknames),
            ignore_missing: self.ignore_missing,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    aad_common::logging::init_logging("aad-users");

    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().context("loading configuration")?;
    if let Some(policy) = args.missing_policy {
        config.resolver.missing_policy = policy;
    }

    let query = args.users_query()?;

    let directory: Arc<dyn DirectoryClient> = match &args.fixture {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading fixture {}", path.display()))?;
            info!(path = %path.display(), "Using fixture directory");
            Arc::new(InMemoryDirectory::from_json(&json)?)
        }
        None => {
            info!(
                tenant_id = %config.directory.tenant_id,
                environment = %config.directory.environment,
                "Using directory API"
            );
            Arc::new(GraphClient::new(&config.directory)?)
        }
    };

    let resolver = UsersResolver::from_config(directory, &config.resolver);
    let outcome = match &args.state {
        Some(path) => resolver.read(&query, &mut JsonFileSink::new(path)).await,
        None => resolver.read(&query, &mut StdoutSink).await,
    };

    match outcome {
        Ok(result) => {
            info!(id = %result.id, users = result.users.len(), "Done");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Reading users failed");
            Err(e.into())
        }
    }
}
