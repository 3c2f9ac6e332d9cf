//! Field validators for data source inputs.

use thiserror::Error;
use uuid::Uuid;

/// A single input value failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field}: {value:?} is not a valid UUID")]
    InvalidUuid { field: String, value: String },

    #[error("{field}: value must not be empty")]
    EmptyString { field: String },
}

/// Value must parse as a UUID (hyphenated or simple form).
pub fn uuid(field: &str, value: &str) -> Result<(), FieldError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| FieldError::InvalidUuid {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Value must contain something other than whitespace.
pub fn no_empty_strings(field: &str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::EmptyString {
            field: field.to_string(),
        });
    }
    Ok(())
}
