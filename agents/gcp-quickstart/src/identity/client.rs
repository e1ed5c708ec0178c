//! IAM Admin and Resource Manager REST client
//!
//! Thin wrapper over the v1 REST endpoints the quickstart needs. Auth is a
//! bearer token obtained once at startup.

use super::types::{
    CreateServiceAccountRequest, Policy, ServiceAccount, ServiceAccountKey, ServiceAccountPage,
    ServiceAccountSpec, SetIamPolicyRequest,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

pub const IAM_API: &str = "https://iam.googleapis.com";
pub const RESOURCE_MANAGER_API: &str = "https://cloudresourcemanager.googleapis.com";

/// Remote operations on service accounts and the project IAM policy
#[async_trait]
pub trait IamApi: Send + Sync {
    /// One page of service accounts in the project
    async fn list_service_accounts(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<ServiceAccountPage>;

    async fn create_service_account(
        &self,
        project_id: &str,
        account_id: &str,
        display_name: &str,
        description: &str,
    ) -> Result<ServiceAccount>;

    async fn create_key(&self, email: &str) -> Result<ServiceAccountKey>;

    async fn get_iam_policy(&self, project_id: &str) -> Result<Policy>;

    /// Write the policy back; the platform rejects a stale etag
    async fn set_iam_policy(&self, project_id: &str, policy: &Policy) -> Result<Policy>;
}

/// `IamApi` over reqwest
pub struct GcpIamClient {
    http: Client,
    token: String,
    iam_base: String,
    crm_base: String,
}

impl GcpIamClient {
    pub fn new(http: Client, token: impl Into<String>) -> Self {
        Self::with_endpoints(http, token, IAM_API, RESOURCE_MANAGER_API)
    }

    pub fn with_endpoints(
        http: Client,
        token: impl Into<String>,
        iam_base: impl Into<String>,
        crm_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token: token.into(),
            iam_base: iam_base.into().trim_end_matches('/').to_string(),
            crm_base: crm_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to {}", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to {}: API returned {}: {}", what, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response to {}", what))
    }
}

#[async_trait]
impl IamApi for GcpIamClient {
    async fn list_service_accounts(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<ServiceAccountPage> {
        let url = format!("{}/v1/projects/{}/serviceAccounts", self.iam_base, project_id);
        debug!(url = %url, page_token = ?page_token, "Listing service accounts");

        let mut request = self.http.get(&url);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        self.send(request, "list service accounts").await
    }

    async fn create_service_account(
        &self,
        project_id: &str,
        account_id: &str,
        display_name: &str,
        description: &str,
    ) -> Result<ServiceAccount> {
        let url = format!("{}/v1/projects/{}/serviceAccounts", self.iam_base, project_id);
        let body = CreateServiceAccountRequest {
            account_id: account_id.to_string(),
            service_account: ServiceAccountSpec {
                display_name: display_name.to_string(),
                description: description.to_string(),
            },
        };

        self.send(self.http.post(&url).json(&body), "create service account")
            .await
    }

    async fn create_key(&self, email: &str) -> Result<ServiceAccountKey> {
        let url = format!("{}/v1/projects/-/serviceAccounts/{}/keys", self.iam_base, email);

        self.send(self.http.post(&url).json(&json!({})), "create service account key")
            .await
    }

    async fn get_iam_policy(&self, project_id: &str) -> Result<Policy> {
        let url = format!("{}/v1/projects/{}:getIamPolicy", self.crm_base, project_id);

        self.send(self.http.post(&url).json(&json!({})), "get IAM policy")
            .await
    }

    async fn set_iam_policy(&self, project_id: &str, policy: &Policy) -> Result<Policy> {
        let url = format!("{}/v1/projects/{}:setIamPolicy", self.crm_base, project_id);

        self.send(
            self.http.post(&url).json(&SetIamPolicyRequest { policy }),
            "set IAM policy",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Bytes,
        extract::State,
        http::{HeaderMap, Method, StatusCode, Uri},
        response::IntoResponse,
        Json, Router,
    };
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded {
        requests: Arc<Mutex<Vec<(Method, String, Option<String>, Value)>>>,
    }

    async fn fake_google(
        State(rec): State<Recorded>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> axum::response::Response {
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        rec.requests
            .lock()
            .unwrap()
            .push((method.clone(), uri.to_string(), auth, body.clone()));

        match (method, uri.path()) {
            (Method::GET, "/v1/projects/demo/serviceAccounts") => {
                if uri.query() == Some("pageToken=next") {
                    Json(serde_json::json!({
                        "accounts": [{"email": "cloud-access-manager@demo.iam.gserviceaccount.com"}]
                    }))
                    .into_response()
                } else {
                    Json(serde_json::json!({
                        "accounts": [{"email": "other@demo.iam.gserviceaccount.com"}],
                        "nextPageToken": "next"
                    }))
                    .into_response()
                }
            }
            (Method::POST, "/v1/projects/demo/serviceAccounts") => Json(serde_json::json!({
                "name": "projects/demo/serviceAccounts/new@demo.iam.gserviceaccount.com",
                "email": "new@demo.iam.gserviceaccount.com",
                "displayName": body["serviceAccount"]["displayName"],
            }))
            .into_response(),
            (Method::POST, "/v1/projects/demo:getIamPolicy") => Json(serde_json::json!({
                "version": 1,
                "etag": "BwX1",
                "bindings": [{"role": "roles/owner", "members": ["user:o@example.com"]}]
            }))
            .into_response(),
            (Method::POST, "/v1/projects/demo:setIamPolicy") => {
                if body["policy"]["etag"] == "stale" {
                    (StatusCode::CONFLICT, "ABORTED: concurrent policy changes").into_response()
                } else {
                    Json(body["policy"].clone()).into_response()
                }
            }
            _ => (StatusCode::NOT_FOUND, "not found").into_response(),
        }
    }

    async fn serve() -> (String, Recorded) {
        let rec = Recorded::default();
        let app = Router::new().fallback(fake_google).with_state(rec.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), rec)
    }

    fn client(base: &str) -> GcpIamClient {
        GcpIamClient::with_endpoints(Client::new(), "ya29.test", base, base)
    }

    #[tokio::test]
    async fn test_list_pages_and_bearer_auth() {
        let (base, rec) = serve().await;
        let iam = client(&base);

        let first = iam.list_service_accounts("demo", None).await.unwrap();
        assert_eq!(first.next_page_token.as_deref(), Some("next"));

        let second = iam.list_service_accounts("demo", Some("next")).await.unwrap();
        assert!(second.next_page_token.is_none());
        assert_eq!(
            second.accounts[0].email,
            "cloud-access-manager@demo.iam.gserviceaccount.com"
        );

        let requests = rec.requests.lock().unwrap();
        assert_eq!(requests[0].2.as_deref(), Some("Bearer ya29.test"));
    }

    #[tokio::test]
    async fn test_create_service_account_body() {
        let (base, rec) = serve().await;
        let iam = client(&base);

        let sa = iam
            .create_service_account("demo", "new", "new", "A test account")
            .await
            .unwrap();
        assert_eq!(sa.email, "new@demo.iam.gserviceaccount.com");
        assert_eq!(sa.display_name, "new");

        let requests = rec.requests.lock().unwrap();
        let body = &requests[0].3;
        assert_eq!(body["accountId"], "new");
        assert_eq!(body["serviceAccount"]["description"], "A test account");
    }

    #[tokio::test]
    async fn test_policy_round_trip_carries_etag() {
        let (base, rec) = serve().await;
        let iam = client(&base);

        let policy = iam.get_iam_policy("demo").await.unwrap();
        assert_eq!(policy.etag.as_deref(), Some("BwX1"));

        let written = iam.set_iam_policy("demo", &policy).await.unwrap();
        assert_eq!(written, policy);

        let requests = rec.requests.lock().unwrap();
        assert_eq!(requests[1].3["policy"]["etag"], "BwX1");
    }

    #[tokio::test]
    async fn test_stale_etag_is_fatal() {
        let (base, _rec) = serve().await;
        let iam = client(&base);

        let policy = Policy {
            etag: Some("stale".to_string()),
            ..Default::default()
        };
        let err = iam.set_iam_policy("demo", &policy).await.unwrap_err();
        assert!(err.to_string().contains("409"));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_error_carries_body() {
        let (base, _rec) = serve().await;
        let iam = client(&base);

        let err = iam.create_key("ghost@demo.iam.gserviceaccount.com").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("create service account key"));
        assert!(message.contains("404"));
    }
}
