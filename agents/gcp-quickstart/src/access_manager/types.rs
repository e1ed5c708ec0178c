//! Cloud Access Manager API types

use crate::identity::ServiceAccountCredential;
use serde::{Deserialize, Serialize};

/// Authenticated context for Cloud Access Manager calls
#[derive(Clone)]
pub struct Session {
    pub(crate) authorization: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// Response envelope used by every endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// A logical deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub deployment_id: String,
    #[serde(default)]
    pub deployment_name: String,
}

/// A connector registration; `token` authorizes the deployed connector
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_name: Option<String>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("token", &"<redacted>")
            .field("connector_name", &self.connector_name)
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateDeploymentRequest<'a> {
    pub deployment_name: &'a str,
    pub registration_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CloudCredential<'a> {
    pub client_email: &'a str,
    pub private_key: &'a str,
    pub project_id: &'a str,
}

impl<'a> From<&'a ServiceAccountCredential> for CloudCredential<'a> {
    fn from(key: &'a ServiceAccountCredential) -> Self {
        Self {
            client_email: &key.client_email,
            private_key: &key.private_key,
            project_id: &key.project_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCloudAccountRequest<'a> {
    pub deployment_id: &'a str,
    pub provider: &'static str,
    pub credential: CloudCredential<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateConnectorRequest<'a> {
    pub deployment_id: &'a str,
    pub connector_name: &'a str,
}

/// Everything the registration step hands to later steps
#[derive(Debug, Clone)]
pub struct Registration {
    pub deployment: Deployment,
    pub connector: Connector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_debug_hides_token() {
        let connector = Connector {
            token: "secret-token".to_string(),
            connector_name: Some("sample_connector".to_string()),
        };
        let debug = format!("{:?}", connector);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("sample_connector"));
    }

    #[test]
    fn test_deployment_envelope() {
        let raw = r#"{"code":201,"status":"success","data":{"deploymentId":"d-1","deploymentName":"sample_deployment"}}"#;
        let resp: ApiResponse<Deployment> = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.data.deployment_id, "d-1");
    }
}
