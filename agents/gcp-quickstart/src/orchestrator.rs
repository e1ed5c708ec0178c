//! Quickstart orchestration
//!
//! Runs every bootstrap step in order. Each step's output feeds the next:
//! the service account feeds key issuance, the key feeds registration, and
//! the connector token feeds the variables file. Any error aborts the run
//! and nothing already created is rolled back.

use crate::access_manager::{self, AccessManager, RegistrationRequest};
use crate::command::CommandRunner;
use crate::config::{QuickstartConfig, SERVICE_ACCOUNT_DESCRIPTION};
use crate::identity::{self, IamApi, ServiceAccount};
use crate::installer;
use crate::platform;
use crate::secrets::{self, SecretSource};
use crate::tfvars::{self, DeploymentInputs};
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Explicit collaborators for one run
pub struct Quickstart<'a> {
    pub config: &'a QuickstartConfig,
    pub iam: &'a dyn IamApi,
    pub access_manager: &'a dyn AccessManager,
    pub runner: &'a dyn CommandRunner,
    pub secrets: &'a dyn SecretSource,
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct QuickstartOutcome {
    pub service_account: ServiceAccount,
    pub deployment_id: String,
    pub tf_vars: PathBuf,
    /// APIs that failed to enable under the best-effort policy
    pub failed_apis: Vec<String>,
    /// Whether the provisioning tool had to be installed
    pub installed_tool: bool,
}

impl<'a> Quickstart<'a> {
    pub async fn run(&self) -> Result<QuickstartOutcome> {
        let config = self.config;
        let layout = &config.layout;

        secrets::ensure_secrets_dir(&layout.secrets_dir())?;

        // GCP project setup
        info!(project = %config.project_id, "☁️  Setting GCP project...");

        let service_account = identity::create_service_account(
            self.iam,
            &config.project_id,
            &config.service_account_id,
            &config.service_account_id,
            SERVICE_ACCOUNT_DESCRIPTION,
        )
        .await?;
        identity::grant_roles(self.iam, &config.project_id, &service_account, &config.roles)
            .await?;
        let credential =
            identity::issue_key(self.iam, &service_account, &layout.service_account_key()).await?;
        let failed_apis = platform::enable_apis(self.runner, &config.apis, config.api_policy).await?;

        info!("✅ GCP project setup complete");

        // Cloud Access Manager setup
        info!("🔗 Setting up Cloud Access Manager...");

        let auth_token = self.secrets.auth_token()?;
        let registration_code = self.secrets.registration_code()?;

        let registration = access_manager::register(
            self.access_manager,
            &RegistrationRequest {
                auth_token: &auth_token,
                registration_code: &registration_code,
                deployment_name: &config.deployment_name,
                connector_name: &config.connector_name,
            },
            &credential,
        )
        .await?;

        info!("✅ Cloud Access Manager setup complete");

        // Terraform preparation
        info!("🧰 Preparing deployment requirements...");

        secrets::generate_ssh_key_pair(self.runner, config.ssh_backend, &layout.ssh_private_key())
            .await?;

        let password = self.secrets.password()?;
        let settings = tfvars::deployment_settings(
            config,
            &DeploymentInputs {
                password: &password,
                registration_code: &registration_code,
                connector_token: &registration.connector.token,
            },
        );
        let tf_vars = layout.tf_vars();
        tfvars::create_tf_vars(&tf_vars, &settings)?;

        let installed_tool = installer::ensure_tool_installed(
            self.runner,
            &config.terraform_binary,
            &config.installer,
            layout.root(),
        )
        .await?;

        info!("🚀 Deploy with Terraform...");

        Ok(QuickstartOutcome {
            service_account,
            deployment_id: registration.deployment.deployment_id,
            tf_vars,
            failed_apis,
            installed_tool,
        })
    }
}
