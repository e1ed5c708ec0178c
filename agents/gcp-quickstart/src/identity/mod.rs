//! Identity & Access Provisioning
//!
//! Find-or-create the quickstart service account, grant it project roles and
//! mint a key for it.
//!
//! ## Example Usage
//!
//! ```ignore
//! use gcp_quickstart::identity::{self, GcpIamClient};
//!
//! let iam = GcpIamClient::new(http, token);
//! let sa = identity::create_service_account(&iam, "my-project", "cam", "cam", "desc").await?;
//! identity::grant_roles(&iam, "my-project", &sa, &["roles/editor".to_string()]).await?;
//! let credential = identity::issue_key(&iam, &sa, "secrets/key.json".as_ref()).await?;
//! ```

pub mod auth;
pub mod client;
pub mod types;

pub use client::{GcpIamClient, IamApi};
pub use types::{Binding, Policy, ServiceAccount, ServiceAccountCredential};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::{debug, info};

/// Look up a service account by email, following every page of the listing
pub async fn find_service_account(
    iam: &dyn IamApi,
    project_id: &str,
    email: &str,
) -> Result<Option<ServiceAccount>> {
    let mut page_token: Option<String> = None;

    loop {
        let page = iam
            .list_service_accounts(project_id, page_token.as_deref())
            .await?;
        debug!(count = page.accounts.len(), "Scanning service account page");

        if let Some(account) = page.accounts.into_iter().find(|a| a.email == email) {
            return Ok(Some(account));
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => return Ok(None),
        }
    }
}

/// Return the existing service account or create it
pub async fn create_service_account(
    iam: &dyn IamApi,
    project_id: &str,
    account_id: &str,
    display_name: &str,
    description: &str,
) -> Result<ServiceAccount> {
    info!("👤 Creating Service Account...");

    let email = format!("{}@{}.iam.gserviceaccount.com", account_id, project_id);
    if let Some(existing) = find_service_account(iam, project_id, &email).await? {
        info!(email = %email, "Service account already exists");
        return Ok(existing);
    }

    let account = iam
        .create_service_account(project_id, account_id, display_name, description)
        .await?;

    info!(email = %account.email, "Created service account");
    Ok(account)
}

/// Mint a key for `account`, persist the decoded credential file at `path`
/// and return it parsed
///
/// An existing file at `path` is overwritten.
pub async fn issue_key(
    iam: &dyn IamApi,
    account: &ServiceAccount,
    path: &Path,
) -> Result<ServiceAccountCredential> {
    info!(email = %account.email, "🔑 Creating key for service account...");

    let key = iam.create_key(&account.email).await?;
    let key_data = STANDARD
        .decode(key.private_key_data.trim())
        .context("Service account key is not valid base64")?;

    write_private_file(path, &key_data)
        .await
        .with_context(|| format!("Failed to write key to {}", path.display()))?;

    info!(path = %path.display(), "Key written");

    serde_json::from_slice(&key_data).context("Service account key is not a JSON credential")
}

/// Append one binding per role for `account` and write the policy back
///
/// Existing bindings are not de-duplicated. The fetched etag is sent back
/// unchanged so a concurrent edit makes the write fail instead of being
/// overwritten.
pub async fn grant_roles(
    iam: &dyn IamApi,
    project_id: &str,
    account: &ServiceAccount,
    roles: &[String],
) -> Result<Policy> {
    let mut policy = iam.get_iam_policy(project_id).await?;

    info!("🛡️  Adding roles:");
    for role in roles {
        info!(role = %role, "  adding role");
        policy
            .bindings
            .push(Binding::for_service_account(role.as_str(), &account.email));
    }

    iam.set_iam_policy(project_id, &policy)
        .await
        .context("Failed to update project IAM policy")
}

pub(crate) async fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}
