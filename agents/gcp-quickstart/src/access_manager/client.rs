//! Cloud Access Manager REST client

use super::types::{
    AddCloudAccountRequest, ApiResponse, Connector, CreateConnectorRequest,
    CreateDeploymentRequest, Deployment, Session,
};
use super::AccessManager;
use crate::identity::ServiceAccountCredential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

/// `AccessManager` over the CAM v1 REST API
pub struct CamClient {
    client: Client,
    api: String,
}

impl CamClient {
    /// `base_url` is the CAM host, e.g. `https://cam.teradici.com`
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            api: format!("{}/api/v1", base_url.trim_end_matches('/')),
        }
    }

    async fn send(&self, session: &Session, request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .header("Authorization", &session.authorization)
            .send()
            .await
            .with_context(|| format!("Failed to {}", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Cloud Access Manager failed to {}: {}: {}", what, status, body);
        }

        Ok(response)
    }

    async fn send_for_data<T: DeserializeOwned>(
        &self,
        session: &Session,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response: ApiResponse<T> = self
            .send(session, request, what)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse response to {}", what))?;

        Ok(response.data)
    }
}

#[async_trait]
impl AccessManager for CamClient {
    async fn authenticate(&self, token: &str) -> Result<Session> {
        debug!("Binding CAM auth token to session");
        Ok(Session {
            authorization: token.to_string(),
        })
    }

    async fn create_deployment(
        &self,
        session: &Session,
        name: &str,
        registration_code: &str,
    ) -> Result<Deployment> {
        let body = CreateDeploymentRequest {
            deployment_name: name,
            registration_code,
        };
        let request = self
            .client
            .post(format!("{}/deployments", self.api))
            .json(&body);

        self.send_for_data(session, request, "create deployment").await
    }

    async fn add_cloud_credential(
        &self,
        session: &Session,
        credential: &ServiceAccountCredential,
        deployment: &Deployment,
    ) -> Result<()> {
        let body = AddCloudAccountRequest {
            deployment_id: &deployment.deployment_id,
            provider: "gcp",
            credential: credential.into(),
        };
        let request = self
            .client
            .post(format!("{}/auth/users/cloudServiceAccount", self.api))
            .json(&body);

        self.send(session, request, "add GCP service account").await?;
        Ok(())
    }

    async fn create_connector(
        &self,
        session: &Session,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Connector> {
        let body = CreateConnectorRequest {
            deployment_id: &deployment.deployment_id,
            connector_name: name,
        };
        let request = self
            .client
            .post(format!("{}/auth/tokens/connector", self.api))
            .json(&body);

        self.send_for_data(session, request, "create connector").await
    }
}
