//! Data source inputs and their validation

use aad_common::validate;
use aad_common::FieldError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const OBJECT_IDS: &str = "object_ids";
pub const USER_PRINCIPAL_NAMES: &str = "user_principal_names";
pub const MAIL_NICKNAMES: &str = "mail_nicknames";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("exactly one of object_ids, user_principal_names or mail_nicknames must be specified (got {0})")]
    ExactlyOneOf(usize),

    #[error("{0} must contain at least one value")]
    EmptyList(&'static str),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Which directory attribute the identifiers refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    ObjectId,
    PrincipalName,
    MailNickname,
}

impl IdentifierKind {
    /// Input attribute name carrying this kind
    pub fn attribute(&self) -> &'static str {
        match self {
            IdentifierKind::ObjectId => OBJECT_IDS,
            IdentifierKind::PrincipalName => USER_PRINCIPAL_NAMES,
            IdentifierKind::MailNickname => MAIL_NICKNAMES,
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::ObjectId => write!(f, "object ID"),
            IdentifierKind::PrincipalName => write!(f, "principal name"),
            IdentifierKind::MailNickname => write!(f, "mail nickname"),
        }
    }
}

/// The identifiers to resolve, tagged with their kind. Order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSet {
    ObjectIds(Vec<String>),
    PrincipalNames(Vec<String>),
    MailNicknames(Vec<String>),
}

impl IdentifierSet {
    pub fn kind(&self) -> IdentifierKind {
        match self {
            IdentifierSet::ObjectIds(_) => IdentifierKind::ObjectId,
            IdentifierSet::PrincipalNames(_) => IdentifierKind::PrincipalName,
            IdentifierSet::MailNicknames(_) => IdentifierKind::MailNickname,
        }
    }

    pub fn identifiers(&self) -> &[String] {
        match self {
            IdentifierSet::ObjectIds(ids)
            | IdentifierSet::PrincipalNames(ids)
            | IdentifierSet::MailNicknames(ids) => ids,
        }
    }

    pub fn len(&self) -> usize {
        self.identifiers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers().is_empty()
    }

    /// Check list and value constraints for this kind.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        if self.is_empty() {
            return Err(ValidationError::EmptyList(kind.attribute()));
        }
        for (i, value) in self.identifiers().iter().enumerate() {
            let field = format!("{}.{}", kind.attribute(), i);
            match kind {
                IdentifierKind::ObjectId => validate::uuid(&field, value)?,
                IdentifierKind::PrincipalName | IdentifierKind::MailNickname => {
                    validate::no_empty_strings(&field, value)?
                }
            }
        }
        Ok(())
    }
}

/// Raw data source arguments as they arrive from configuration or the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_nicknames: Option<Vec<String>>,
    pub ignore_missing: bool,
}

impl UsersQuery {
    pub fn object_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn user_principal_names<I, S>(upns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_principal_names: Some(upns.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn mail_nicknames<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mail_nicknames: Some(aliases.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// Select the single supplied identifier list and validate it.
    pub fn validate(&self) -> Result<IdentifierSet, ValidationError> {
        let supplied: Vec<IdentifierSet> = [
            self.object_ids.clone().map(IdentifierSet::ObjectIds),
            self.user_principal_names
                .clone()
                .map(IdentifierSet::PrincipalNames),
            self.mail_nicknames.clone().map(IdentifierSet::MailNicknames),
        ]
        .into_iter()
        .flatten()
        .collect();

        let set = match <[IdentifierSet; 1]>::try_from(supplied) {
            Ok([set]) => set,
            Err(supplied) => return Err(ValidationError::ExactlyOneOf(supplied.len())),
        };

        set.validate()?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_the_supplied_list() {
        let set = UsersQuery::mail_nicknames(["alice", "bob"]).validate().unwrap();
        assert_eq!(set.kind(), IdentifierKind::MailNickname);
        assert_eq!(set.identifiers(), ["alice", "bob"]);
    }

    #[test]
    fn test_rejects_none_and_several() {
        assert_eq!(
            UsersQuery::default().validate(),
            Err(ValidationError::ExactlyOneOf(0))
        );

        let mut query = UsersQuery::user_principal_names(["a@x.com"]);
        query.mail_nicknames = Some(vec!["a".into()]);
        assert_eq!(query.validate(), Err(ValidationError::ExactlyOneOf(2)));
    }

    #[test]
    fn test_rejects_empty_list() {
        let query = UsersQuery::object_ids(Vec::<String>::new());
        assert_eq!(query.validate(), Err(ValidationError::EmptyList(OBJECT_IDS)));
    }

    #[test]
    fn test_object_ids_must_be_uuids() {
        let query = UsersQuery::object_ids(["00000000-0000-0000-0000-000000000001", "nope"]);
        let err = query.validate().unwrap_err();
        assert!(err.to_string().contains("object_ids.1"));
    }

    #[test]
    fn test_names_must_not_be_blank() {
        let query = UsersQuery::user_principal_names(["a@x.com", " "]);
        assert!(matches!(
            query.validate(),
            Err(ValidationError::Field(FieldError::EmptyString { .. }))
        ));
    }

    #[test]
    fn test_deserialize_defaults_ignore_missing() {
        let query: UsersQuery =
            serde_json::from_str(r#"{"user_principal_names": ["a@x.com"]}"#).unwrap();
        assert!(!query.ignore_missing);
        assert!(query.validate().is_ok());
    }
}
