//! Quickstart configuration
//!
//! Resolved once at startup from CLI flags and the environment, then passed
//! by reference into every step.

use crate::error::QuickstartError;
use std::path::{Path, PathBuf};

/// Environment variable naming the target GCP project
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Service account id created for Cloud Access Manager
pub const SERVICE_ACCOUNT_ID: &str = "cloud-access-manager";

/// Description attached to the service account
pub const SERVICE_ACCOUNT_DESCRIPTION: &str =
    "Account used by Cloud Access Manager to manage PCoIP workstations.";

/// Roles granted to the service account
pub const SERVICE_ACCOUNT_ROLES: &[&str] = &[
    "roles/editor",
    "roles/cloudkms.cryptoKeyEncrypterDecrypter",
];

/// Platform APIs the deployment depends on
pub const REQUIRED_APIS: &[&str] = &[
    "deploymentmanager.googleapis.com",
    "cloudkms.googleapis.com",
    "cloudresourcemanager.googleapis.com",
    "compute.googleapis.com",
];

pub const DEFAULT_DEPLOYMENT_DIR: &str = "deployments/gcp/dc-cac-ws";
pub const DEFAULT_CAM_URL: &str = "https://cam.teradici.com";
pub const DEFAULT_DEPLOYMENT_NAME: &str = "sample_deployment";
pub const DEFAULT_CONNECTOR_NAME: &str = "sample_connector";

const TF_VARS_FILE: &str = "terraform.tfvars";
const SECRETS_DIR: &str = "secrets";
const SA_KEY_FILE: &str = "gcp_service_account_key.json";
const SSH_KEY_FILE: &str = "cam_admin_id_rsa";

/// How a failing `gcloud services enable` is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiEnablePolicy {
    /// Abort the run on the first failing API
    #[default]
    Strict,
    /// Log a warning and continue
    BestEffort,
}

/// How the admin SSH key pair is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SshKeyBackend {
    /// Shell out to `ssh-keygen` (RSA, empty passphrase)
    #[default]
    SshKeygen,
    /// Generate an Ed25519 key in-process
    Native,
}

impl std::fmt::Display for SshKeyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SshKeyBackend::SshKeygen => write!(f, "ssh-keygen"),
            SshKeyBackend::Native => write!(f, "native"),
        }
    }
}

/// File layout of a deployment directory
///
/// Relative paths are what the variables file records, since the
/// provisioning tool runs from the deployment directory. Absolute (joined)
/// paths are what this process reads and writes.
#[derive(Debug, Clone)]
pub struct DeploymentLayout {
    root: PathBuf,
}

impl DeploymentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn secrets_dir(&self) -> PathBuf {
        self.root.join(SECRETS_DIR)
    }

    pub fn tf_vars(&self) -> PathBuf {
        self.root.join(TF_VARS_FILE)
    }

    pub fn service_account_key(&self) -> PathBuf {
        self.root.join(Self::service_account_key_rel())
    }

    pub fn ssh_private_key(&self) -> PathBuf {
        self.root.join(Self::ssh_private_key_rel())
    }

    pub fn service_account_key_rel() -> String {
        format!("{SECRETS_DIR}/{SA_KEY_FILE}")
    }

    pub fn ssh_private_key_rel() -> String {
        format!("{SECRETS_DIR}/{SSH_KEY_FILE}")
    }

    pub fn ssh_public_key_rel() -> String {
        format!("{SECRETS_DIR}/{SSH_KEY_FILE}.pub")
    }
}

/// Values the operator may provide up front instead of being prompted
#[derive(Debug, Clone, Default)]
pub struct PresetSecrets {
    pub auth_token: Option<String>,
    pub registration_code: Option<String>,
    pub password: Option<String>,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct QuickstartConfig {
    pub project_id: String,
    pub layout: DeploymentLayout,
    pub service_account_id: String,
    pub roles: Vec<String>,
    pub apis: Vec<String>,
    pub api_policy: ApiEnablePolicy,
    pub cam_url: String,
    pub deployment_name: String,
    pub connector_name: String,
    pub ssh_backend: SshKeyBackend,
    /// Binary looked up on PATH before installing
    pub terraform_binary: String,
    /// Installer invocation run from the deployment directory when the binary is missing
    pub installer: Vec<String>,
    pub presets: PresetSecrets,
}

impl QuickstartConfig {
    /// Build a configuration with the stock constants
    ///
    /// Fails with `MissingEnvironment` when no project id was supplied.
    pub fn new(project_id: Option<String>, deployment_dir: impl Into<PathBuf>) -> Result<Self, QuickstartError> {
        let project_id = project_id
            .filter(|p| !p.trim().is_empty())
            .ok_or(QuickstartError::MissingEnvironment(PROJECT_ENV))?;

        Ok(Self {
            project_id,
            layout: DeploymentLayout::new(deployment_dir),
            service_account_id: SERVICE_ACCOUNT_ID.to_string(),
            roles: SERVICE_ACCOUNT_ROLES.iter().map(|r| r.to_string()).collect(),
            apis: REQUIRED_APIS.iter().map(|a| a.to_string()).collect(),
            api_policy: ApiEnablePolicy::default(),
            cam_url: DEFAULT_CAM_URL.to_string(),
            deployment_name: DEFAULT_DEPLOYMENT_NAME.to_string(),
            connector_name: DEFAULT_CONNECTOR_NAME.to_string(),
            ssh_backend: SshKeyBackend::default(),
            terraform_binary: "terraform".to_string(),
            installer: ["sudo", "python3", "install-terraform.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            presets: PresetSecrets::default(),
        })
    }

    /// Email the service account has (or will have) in this project
    pub fn service_account_email(&self) -> String {
        format!(
            "{}@{}.iam.gserviceaccount.com",
            self.service_account_id, self.project_id
        )
    }
}
