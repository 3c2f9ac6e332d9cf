//! Output of a users read

use aad_graph::User;
use serde::{Deserialize, Serialize};

/// One resolved user, flattened to the data source's output attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub account_enabled: Option<bool>,
    pub display_name: Option<String>,
    pub immutable_id: Option<String>,
    pub mail: Option<String>,
    pub mail_nickname: Option<String>,
    pub object_id: String,
    pub onpremises_sam_account_name: Option<String>,
    pub onpremises_user_principal_name: Option<String>,
    pub usage_location: Option<String>,
    pub user_principal_name: String,
}

impl UserRecord {
    /// Flatten a directory user. Returns `None` when the object id or
    /// principal name is missing.
    pub fn from_user(user: &User) -> Option<Self> {
        let object_id = user.object_id.clone()?;
        let user_principal_name = user.user_principal_name.clone()?;

        Some(Self {
            account_enabled: user.account_enabled,
            display_name: user.display_name.clone(),
            immutable_id: user.immutable_id.clone(),
            mail: user.mail.clone(),
            mail_nickname: user.mail_nickname.clone(),
            object_id,
            onpremises_sam_account_name: user.onpremises_sam_account_name(),
            onpremises_user_principal_name: user.onpremises_user_principal_name(),
            usage_location: user.usage_location.clone(),
            user_principal_name,
        })
    }
}

/// The aggregate written to the result sink.
///
/// The three identifier lists are rebuilt from the resolved users, in
/// resolution order, not echoed from the input. Mail nicknames may be
/// absent on a user and are carried as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResult {
    pub id: String,
    pub object_ids: Vec<String>,
    pub user_principal_names: Vec<String>,
    pub mail_nicknames: Vec<Option<String>>,
    pub users: Vec<UserRecord>,
}
