//! Cloud Access Manager registration
//!
//! Creates the remote deployment, hands it the GCP credential and registers a
//! connector whose token ends up in the variables file. Nothing here is
//! idempotent: re-running creates new remote resources, and a failure
//! part-way leaves the earlier ones in place.

pub mod client;
pub mod types;

pub use client::CamClient;
pub use types::{Connector, Deployment, Registration, Session};

use crate::identity::ServiceAccountCredential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Remote control-plane operations, called strictly in order
#[async_trait]
pub trait AccessManager: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Session>;

    async fn create_deployment(
        &self,
        session: &Session,
        name: &str,
        registration_code: &str,
    ) -> Result<Deployment>;

    async fn add_cloud_credential(
        &self,
        session: &Session,
        credential: &ServiceAccountCredential,
        deployment: &Deployment,
    ) -> Result<()>;

    async fn create_connector(
        &self,
        session: &Session,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Connector>;
}

/// Names used for the remote resources
#[derive(Debug, Clone)]
pub struct RegistrationRequest<'a> {
    pub auth_token: &'a str,
    pub registration_code: &'a str,
    pub deployment_name: &'a str,
    pub connector_name: &'a str,
}

/// Authenticate, create the deployment, attach the credential, create the connector
pub async fn register(
    cam: &dyn AccessManager,
    request: &RegistrationRequest<'_>,
    credential: &ServiceAccountCredential,
) -> Result<Registration> {
    let session = cam
        .authenticate(request.auth_token)
        .await
        .context("Failed to authenticate with Cloud Access Manager")?;

    let deployment = cam
        .create_deployment(&session, request.deployment_name, request.registration_code)
        .await?;
    info!(deployment_id = %deployment.deployment_id, "Created deployment");

    cam.add_cloud_credential(&session, credential, &deployment)
        .await?;
    info!(client_email = %credential.client_email, "Added GCP service account to deployment");

    let connector = cam
        .create_connector(&session, request.connector_name, &deployment)
        .await?;
    info!(connector = %request.connector_name, "Created connector");

    Ok(Registration {
        deployment,
        connector,
    })
}
