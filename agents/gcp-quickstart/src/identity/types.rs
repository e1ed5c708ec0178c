//! IAM and Resource Manager wire types

use serde::{Deserialize, Serialize};

/// A service account as returned by the IAM API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub unique_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

/// One page of `serviceAccounts.list`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountPage {
    #[serde(default)]
    pub accounts: Vec<ServiceAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Body of `serviceAccounts.create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAccountRequest {
    pub account_id: String,
    pub service_account: ServiceAccountSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountSpec {
    pub display_name: String,
    pub description: String,
}

/// A newly minted service account key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub name: String,
    /// Base64-encoded credential file
    pub private_key_data: String,
}

/// Decoded JSON credential file of a service account key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountCredential {
    #[serde(rename = "type", default)]
    pub credential_type: String,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
}

/// An IAM policy
///
/// Fields this tool does not touch (audit configs and the like) are kept in
/// `extra` so a read-modify-write does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Associates members with a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
}

impl Binding {
    /// Binding granting `role` to a single service account
    pub fn for_service_account(role: impl Into<String>, email: &str) -> Self {
        Self {
            role: role.into(),
            members: vec![format!("serviceAccount:{}", email)],
            condition: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SetIamPolicyRequest<'a> {
    pub policy: &'a Policy,
}
