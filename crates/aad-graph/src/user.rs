//! Directory user object

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const ONPREMISES_SAM_ACCOUNT_NAME: &str = "onPremisesSamAccountName";
const ONPREMISES_USER_PRINCIPAL_NAME: &str = "onPremisesUserPrincipalName";

/// A user as returned by the directory.
///
/// `object_id` and `user_principal_name` are always present on real
/// directory objects but are kept optional here; callers decide whether a
/// record without them is acceptable. Attributes the directory returns that
/// have no typed field land in `additional_properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_location: Option<String>,
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

impl User {
    /// Attribute bag entry as a string. Absent, null and non-string values
    /// all read as `None`.
    pub fn additional_string(&self, key: &str) -> Option<String> {
        self.additional_properties
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn onpremises_sam_account_name(&self) -> Option<String> {
        self.additional_string(ONPREMISES_SAM_ACCOUNT_NAME)
    }

    pub fn onpremises_user_principal_name(&self) -> Option<String> {
        self.additional_string(ONPREMISES_USER_PRINCIPAL_NAME)
    }
}

/// One page of a user list query
#[derive(Debug, Deserialize)]
pub(crate) struct UserPage {
    #[serde(default)]
    pub value: Vec<User>,
    #[serde(rename = "odata.nextLink", default)]
    pub next_link: Option<String>,
}
