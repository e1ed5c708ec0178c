//! GCP access tokens
//!
//! Tries the GCE metadata server first (Cloud Shell, GCE, GKE), then falls
//! back to the gcloud CLI for local development.

use crate::command::{CommandRunner, Invocation};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Obtain an OAuth access token for the Google APIs
pub async fn fetch_access_token(
    http: &Client,
    runner: &dyn CommandRunner,
    metadata_url: &str,
) -> Result<String> {
    match http
        .get(metadata_url)
        .header("Metadata-Flavor", "Google")
        .timeout(Duration::from_secs(3))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            let token: MetadataToken = resp
                .json()
                .await
                .context("Invalid token response from metadata server")?;
            debug!("Access token obtained from metadata server");
            Ok(token.access_token)
        }
        _ => {
            let output = runner
                .output(
                    &Invocation::new("gcloud").args(["auth", "application-default", "print-access-token"]),
                )
                .await
                .context("gcloud CLI not available")?;

            if !output.status.success() {
                anyhow::bail!(
                    "gcloud auth failed - run 'gcloud auth application-default login': {}",
                    output.stderr.trim()
                );
            }

            debug!("Access token obtained from gcloud CLI");
            Ok(output.stdout.trim().to_string())
        }
    }
}
