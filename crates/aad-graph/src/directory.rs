//! The directory lookup capability and an in-memory implementation

use crate::error::{GraphError, Result};
use crate::user::User;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Fetches single users from a directory.
///
/// Each method returns [`GraphError::NotFound`] when the identifier does not
/// resolve to a user; every other error means the lookup itself failed.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn get_by_principal_name(&self, upn: &str) -> Result<User>;

    async fn get_by_object_id(&self, object_id: &str) -> Result<User>;

    async fn get_by_mail_nickname(&self, mail_nickname: &str) -> Result<User>;
}

/// A lookup made against an [`InMemoryDirectory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    PrincipalName(String),
    ObjectId(String),
    MailNickname(String),
}

/// Directory over a fixed user list. Records every lookup in call order.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: Vec<User>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<Lookup>>,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    /// Users from a JSON array in directory wire format.
    pub fn from_json(json: &str) -> Result<Self> {
        let users: Vec<User> = serde_json::from_str(json)?;
        Ok(Self::new(users))
    }

    /// Lookups of `identifier` fail with a server error instead of resolving.
    pub fn with_failure(mut self, identifier: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(identifier.into(), message.into());
        self
    }

    pub fn calls(&self) -> Vec<Lookup> {
        self.calls.lock().clone()
    }

    fn lookup<F>(&self, call: Lookup, identifier: &str, describe: &str, pick: F) -> Result<User>
    where
        F: Fn(&User) -> bool,
    {
        self.calls.lock().push(call);

        if let Some(message) = self.failures.get(identifier) {
            return Err(GraphError::Server(message.clone()));
        }

        self.users
            .iter()
            .find(|u| pick(u))
            .cloned()
            .ok_or_else(|| GraphError::NotFound(format!("{} {:?}", describe, identifier)))
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn get_by_principal_name(&self, upn: &str) -> Result<User> {
        self.lookup(Lookup::PrincipalName(upn.to_string()), upn, "user", |u| {
            u.user_principal_name
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case(upn))
        })
    }

    async fn get_by_object_id(&self, object_id: &str) -> Result<User> {
        self.lookup(
            Lookup::ObjectId(object_id.to_string()),
            object_id,
            "user with object ID",
            |u| {
                u.object_id
                    .as_deref()
                    .is_some_and(|v| v.eq_ignore_ascii_case(object_id))
            },
        )
    }

    async fn get_by_mail_nickname(&self, mail_nickname: &str) -> Result<User> {
        self.lookup(
            Lookup::MailNickname(mail_nickname.to_string()),
            mail_nickname,
            "user with mail nickname",
            |u| u.mail_nickname.as_deref() == Some(mail_nickname),
        )
    }
}
