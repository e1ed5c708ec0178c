//! Provisioning tool installation

use crate::command::{CommandRunner, Invocation};
use crate::error::QuickstartError;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Make sure `binary` resolves on PATH, running `installer` from `work_dir`
/// when it does not
///
/// Returns whether an install took place. The installer usually needs
/// sudo, so it only runs when the lookup fails.
pub async fn ensure_tool_installed(
    runner: &dyn CommandRunner,
    binary: &str,
    installer: &[String],
    work_dir: &Path,
) -> Result<bool> {
    if let Ok(found) = which::which(binary) {
        debug!(binary = %binary, path = %found.display(), "Already installed");
        return Ok(false);
    }

    info!(binary = %binary, "📦 Installing provisioning tool...");

    let invocation = Invocation::from_argv(installer)
        .context("Installer command is empty")?
        .current_dir(work_dir);
    let status = runner.status(&invocation).await?;

    if !status.success() {
        return Err(QuickstartError::ToolInstallFailed {
            tool: binary.to_string(),
            status: status.to_string(),
        }
        .into());
    }

    info!(binary = %binary, "Installed");
    Ok(true)
}
