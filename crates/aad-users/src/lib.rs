//! # AzureAD users data source
//!
//! Resolves a list of directory users, given by object id, principal name or
//! mail nickname, into flattened user records plus a stable identity.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aad_graph::InMemoryDirectory;
//! use aad_users::{MemorySink, UsersQuery, UsersResolver};
//!
//! # async fn run() -> aad_users::Result<()> {
//! let directory = Arc::new(InMemoryDirectory::from_json(r#"[
//!     {"objectId": "00000000-0000-0000-0000-000000000001", "userPrincipalName": "a@x.com"}
//! ]"#).expect("fixture"));
//!
//! let resolver = UsersResolver::new(directory);
//! let mut sink = MemorySink::new();
//! let result = resolver
//!     .read(&UsersQuery::user_principal_names(["a@x.com"]), &mut sink)
//!     .await?;
//! assert_eq!(result.users.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Identifiers are looked up sequentially in input order. With
//! `ignore_missing` set, identifiers that resolve to nothing are handled per
//! [`MissingUserPolicy`]: skipped (default) or ending the lookups.

pub mod error;
pub mod identity;
pub mod query;
pub mod resolver;
pub mod result;
pub mod sink;

pub use aad_config::MissingUserPolicy;
pub use error::{ResolveError, Result};
pub use identity::users_id;
pub use query::{IdentifierKind, IdentifierSet, UsersQuery, ValidationError};
pub use resolver::UsersResolver;
pub use result::{UserRecord, UsersResult};
pub use sink::{JsonFileSink, MemorySink, ResultSink, SinkError, StdoutSink};
