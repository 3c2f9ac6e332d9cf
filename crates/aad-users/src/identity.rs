//! Stable identity for a users read

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha1::{Digest, Sha1};

pub const ID_PREFIX: &str = "users#";
const SEPARATOR: &str = "-";

/// `users#` followed by the URL-safe base64 SHA-1 of the principal names
/// joined with `-`. Order-sensitive.
pub fn users_id<S: AsRef<str>>(principal_names: &[S]) -> String {
    let joined = principal_names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    let digest = Sha1::digest(joined.as_bytes());
    format!("{}{}", ID_PREFIX, URL_SAFE.encode(digest))
}
