//! GCP Quickstart
//!
//! One-shot bootstrap of a Cloud Access Manager deployment on GCP. Run it
//! once per deployment from Cloud Shell; it refuses to overwrite an existing
//! `terraform.tfvars`.
//!
//! # Usage
//! ```bash
//! # Interactive (prompts for the CAM token, registration code and password)
//! GOOGLE_CLOUD_PROJECT=my-project gcp-quickstart
//!
//! # Non-interactive
//! gcp-quickstart --project my-project --auth-token "$TOKEN" \
//!     --registration-code "$REG" --password "$PW" --ssh-key-backend native
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcp_quickstart::config::{
    ApiEnablePolicy, PresetSecrets, QuickstartConfig, SshKeyBackend, DEFAULT_CAM_URL,
    DEFAULT_CONNECTOR_NAME, DEFAULT_DEPLOYMENT_DIR, DEFAULT_DEPLOYMENT_NAME, PROJECT_ENV,
};
use gcp_quickstart::identity::auth::{fetch_access_token, METADATA_TOKEN_URL};
use gcp_quickstart::{
    CamClient, ConsoleSecretSource, GcpIamClient, Quickstart, QuickstartOutcome,
    SystemCommandRunner,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser, Debug)]
#[command(name = "gcp-quickstart")]
#[command(about = "Bootstrap a GCP project for Cloud Access Manager", long_about = None)]
#[command(version)]
struct Cli {
    /// GCP project ID
    #[arg(long, env = PROJECT_ENV)]
    project: Option<String>,

    /// Deployment directory holding terraform.tfvars.sample
    #[arg(long, default_value = DEFAULT_DEPLOYMENT_DIR)]
    deployment_dir: PathBuf,

    /// Cloud Access Manager base URL
    #[arg(long, default_value = DEFAULT_CAM_URL)]
    cam_url: String,

    /// Name of the deployment created in Cloud Access Manager
    #[arg(long, default_value = DEFAULT_DEPLOYMENT_NAME)]
    deployment_name: String,

    /// Name of the connector created in Cloud Access Manager
    #[arg(long, default_value = DEFAULT_CONNECTOR_NAME)]
    connector_name: String,

    /// Cloud Access Manager auth token (prompted when absent)
    #[arg(long, env = "CAM_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// PCoIP registration code (prompted when absent)
    #[arg(long, env = "PCOIP_REGISTRATION_CODE", hide_env_values = true)]
    registration_code: Option<String>,

    /// Active Directory admin password (prompted when absent)
    #[arg(long, env = "AD_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// OAuth access token for the Google APIs (metadata server or gcloud when absent)
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// What to do when `gcloud services enable` fails
    #[arg(long, value_enum, default_value = "strict")]
    api_policy: ApiPolicyArg,

    /// How to generate the admin SSH key pair. `native` writes an Ed25519
    /// key under the same `cam_admin_id_rsa` file name
    #[arg(long, value_enum, default_value = "ssh-keygen")]
    ssh_key_backend: SshBackendArg,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ApiPolicyArg {
    /// Abort on the first API that fails to enable
    Strict,
    /// Warn and continue
    BestEffort,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SshBackendArg {
    /// RSA key via the ssh-keygen binary
    SshKeygen,
    /// Ed25519 key generated in-process
    Native,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

impl Cli {
    fn into_config(self) -> Result<(QuickstartConfig, Option<String>)> {
        let mut config = QuickstartConfig::new(self.project, self.deployment_dir)?;

        config.cam_url = self.cam_url;
        config.deployment_name = self.deployment_name;
        config.connector_name = self.connector_name;
        config.api_policy = match self.api_policy {
            ApiPolicyArg::Strict => ApiEnablePolicy::Strict,
            ApiPolicyArg::BestEffort => ApiEnablePolicy::BestEffort,
        };
        config.ssh_backend = match self.ssh_key_backend {
            SshBackendArg::SshKeygen => SshKeyBackend::SshKeygen,
            SshBackendArg::Native => SshKeyBackend::Native,
        };
        config.presets = PresetSecrets {
            auth_token: self.auth_token,
            registration_code: self.registration_code,
            password: self.password,
        };

        Ok((config, self.access_token))
    }
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    match run(cli).await {
        Ok(outcome) => {
            handoff(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<QuickstartOutcome> {
    let (config, access_token) = cli.into_config()?;

    info!(project = %config.project_id, "🚀 GCP Quickstart starting...");

    let http = reqwest::Client::builder()
        .user_agent(concat!("gcp-quickstart/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let runner = SystemCommandRunner;

    let token = match access_token {
        Some(token) => token,
        None => fetch_access_token(&http, &runner, METADATA_TOKEN_URL).await?,
    };

    let iam = GcpIamClient::new(http.clone(), token);
    let cam = CamClient::new(http, &config.cam_url);
    let secrets = ConsoleSecretSource::new(config.presets.clone());

    Quickstart {
        config: &config,
        iam: &iam,
        access_manager: &cam,
        runner: &runner,
        secrets: &secrets,
    }
    .run()
    .await
}

fn handoff(outcome: &QuickstartOutcome) {
    for api in &outcome.failed_apis {
        warn!(api = %api, "API was not enabled; enable it before deploying");
    }

    println!("{}", summary(outcome));
}

fn summary(outcome: &QuickstartOutcome) -> String {
    let dir = outcome
        .tf_vars
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    let mut lines = vec![
        "\n✅ Quickstart complete".to_string(),
        format!("  Service account: {}", outcome.service_account.email),
        format!("  Deployment ID:   {}", outcome.deployment_id),
        format!("  Variables file:  {}", outcome.tf_vars.display()),
    ];
    if outcome.installed_tool {
        lines.push("  Terraform:       installed by the quickstart".to_string());
    }
    lines.push(format!(
        "\nDeploy with:\n  cd {} && terraform init && terraform apply",
        dir
    ));
    lines.join("\n")
}
