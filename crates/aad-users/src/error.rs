//! Errors of a users read. Every variant ends the read; nothing is written
//! to the result sink once one occurs.

use crate::query::{IdentifierKind, ValidationError};
use crate::sink::SinkError;
use aad_graph::GraphError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Error finding user by {kind} {identifier:?}: {source}")]
    Lookup {
        kind: IdentifierKind,
        identifier: String,
        #[source]
        source: GraphError,
    },

    #[error("Unexpected number of users returned ({got} != {expected})")]
    CountMismatch { got: usize, expected: usize },

    #[error("No users were returned")]
    EmptyResult,

    #[error("User with missing object ID or principal name was found: {record}")]
    MissingField { record: String },

    #[error("Reading users timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to write result: {0}")]
    Sink(#[from] SinkError),
}
