//! Resolves identifier lists into user records

use crate::error::{ResolveError, Result};
use crate::identity::users_id;
use crate::query::{IdentifierKind, IdentifierSet, UsersQuery};
use crate::result::{UserRecord, UsersResult};
use crate::sink::ResultSink;
use aad_config::{MissingUserPolicy, ResolverConfig};
use aad_graph::{DirectoryClient, GraphError, User};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// Looks up every identifier of a set, one at a time and in order, then
/// checks and flattens what came back.
pub struct UsersResolver {
    directory: Arc<dyn DirectoryClient>,
    missing_policy: MissingUserPolicy,
    read_timeout: Option<Duration>,
}

impl UsersResolver {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self {
            directory,
            missing_policy: MissingUserPolicy::default(),
            read_timeout: None,
        }
    }

    pub fn from_config(directory: Arc<dyn DirectoryClient>, config: &ResolverConfig) -> Self {
        let read_timeout =
            (config.read_timeout_secs > 0).then(|| Duration::from_secs(config.read_timeout_secs));
        Self::new(directory)
            .with_missing_policy(config.missing_policy)
            .with_read_timeout(read_timeout)
    }

    pub fn with_missing_policy(mut self, policy: MissingUserPolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Validate the query, resolve it and write the aggregate to `sink`.
    ///
    /// The sink is written exactly once on success and never on failure.
    pub async fn read(&self, query: &UsersQuery, sink: &mut dyn ResultSink) -> Result<UsersResult> {
        let set = query.validate()?;

        let span = info_span!(
            "read_users",
            kind = %set.kind(),
            count = set.len(),
            ignore_missing = query.ignore_missing,
        );

        let resolving = self.resolve(&set, query.ignore_missing).instrument(span);
        let result = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, resolving)
                .await
                .map_err(|_| ResolveError::Timeout(limit))??,
            None => resolving.await?,
        };

        sink.write(&result)?;
        info!(id = %result.id, users = result.users.len(), "Users read complete");
        Ok(result)
    }

    /// Look up, reconcile and project. Does not touch any sink.
    pub async fn resolve(&self, set: &IdentifierSet, ignore_missing: bool) -> Result<UsersResult> {
        let kind = set.kind();
        let expected = set.len();
        let mut users = Vec::with_capacity(expected);

        for identifier in set.identifiers() {
            debug!(kind = %kind, identifier = %identifier, "Looking up user");

            match self.lookup(kind, identifier).await {
                Ok(user) => users.push(user),
                Err(e) if ignore_missing && e.is_not_found() => match self.missing_policy {
                    MissingUserPolicy::Skip => {
                        warn!(kind = %kind, identifier = %identifier, "User not found, skipping");
                    }
                    MissingUserPolicy::StopAtFirstMiss => {
                        warn!(
                            kind = %kind,
                            identifier = %identifier,
                            "User not found, not looking up remaining identifiers"
                        );
                        break;
                    }
                },
                Err(source) => {
                    return Err(ResolveError::Lookup {
                        kind,
                        identifier: identifier.clone(),
                        source,
                    })
                }
            }
        }

        // Unreachable with the current loop: every successful lookup pushes one user
        if !ignore_missing && users.len() != expected {
            return Err(ResolveError::CountMismatch {
                got: users.len(),
                expected,
            });
        }
        if ignore_missing && users.is_empty() {
            return Err(ResolveError::EmptyResult);
        }

        project(&users)
    }

    async fn lookup(&self, kind: IdentifierKind, identifier: &str) -> std::result::Result<User, GraphError> {
        match kind {
            IdentifierKind::PrincipalName => self.directory.get_by_principal_name(identifier).await,
            IdentifierKind::ObjectId => self.directory.get_by_object_id(identifier).await,
            IdentifierKind::MailNickname => self.directory.get_by_mail_nickname(identifier).await,
        }
    }
}

/// Flatten resolved users into the aggregate and derive its id.
fn project(users: &[User]) -> Result<UsersResult> {
    let mut result = UsersResult {
        id: String::new(),
        object_ids: Vec::with_capacity(users.len()),
        user_principal_names: Vec::with_capacity(users.len()),
        mail_nicknames: Vec::with_capacity(users.len()),
        users: Vec::with_capacity(users.len()),
    };

    for user in users {
        let record = UserRecord::from_user(user).ok_or_else(|| ResolveError::MissingField {
            record: format!("{:?}", user),
        })?;

        result.object_ids.push(record.object_id.clone());
        result.user_principal_names.push(record.user_principal_name.clone());
        result.mail_nicknames.push(record.mail_nickname.clone());
        result.users.push(record);
    }

    result.id = users_id(&result.user_principal_names);
    Ok(result)
}
