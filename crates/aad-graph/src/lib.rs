//! # AzureAD Graph directory client
//!
//! Looks up directory users by principal name, object id or mail nickname.
//!
//! - [`DirectoryClient`]: the lookup capability consumed by data sources
//! - [`GraphClient`]: HTTP implementation with client-credentials auth,
//!   token caching and retry
//! - [`InMemoryDirectory`]: fixed user list, for tests and fixtures
//!
//! ```rust,no_run
//! use aad_config::DirectoryConfig;
//! use aad_graph::{DirectoryClient, GraphClient};
//!
//! # async fn run() -> aad_graph::Result<()> {
//! let config = DirectoryConfig {
//!     tenant_id: "contoso.onmicrosoft.com".into(),
//!     client_id: "app-id".into(),
//!     client_secret: "secret".into(),
//!     ..Default::default()
//! };
//! let client = GraphClient::new(&config)?;
//! let user = client.get_by_principal_name("alice@contoso.com").await?;
//! println!("{:?}", user.display_name);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod directory;
pub mod error;
pub mod user;

pub use client::GraphClient;
pub use directory::{DirectoryClient, InMemoryDirectory, Lookup};
pub use error::{GraphError, Result};
pub use user::User;
