//! Precondition failures
//!
//! Failures the quickstart detects itself. Everything else (HTTP, I/O,
//! remote API rejections) travels as `anyhow::Error` with context attached.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when a precondition of the bootstrap is violated
#[derive(Debug, Error)]
pub enum QuickstartError {
    /// A required environment variable was not set
    #[error("Required environment variable {0} is not set")]
    MissingEnvironment(&'static str),

    /// The variables file was already rendered by an earlier run
    #[error("{} already exists. This tool is meant for new deployments only", .0.display())]
    VariablesFileExists(PathBuf),

    /// A template key has no resolved value
    #[error("Required value for {key} missing. Variables file {} not created", path.display())]
    MissingSetting { key: String, path: PathBuf },

    /// The provisioning tool installer exited unsuccessfully
    #[error("Error installing {tool} (exit status: {status})")]
    ToolInstallFailed { tool: String, status: String },

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed (exit status: {status})")]
    CommandFailed { command: String, status: String },
}
