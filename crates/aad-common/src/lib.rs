//! Shared plumbing for the AzureAD users workspace: logging setup and the
//! field validators applied to data source inputs.

pub mod logging;
pub mod validate;

pub use validate::FieldError;
