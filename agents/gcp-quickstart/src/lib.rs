//! GCP Quickstart Library
//!
//! Bootstraps a GCP project for a Cloud Access Manager deployment: service
//! account, roles and key, platform APIs, remote registration, SSH keys and
//! the Terraform variables file.

pub mod access_manager;
pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod installer;
pub mod orchestrator;
pub mod platform;
pub mod secrets;
pub mod tfvars;

#[cfg(test)]
mod testing;

pub use access_manager::{AccessManager, CamClient};
pub use command::{CommandRunner, SystemCommandRunner};
pub use config::QuickstartConfig;
pub use error::QuickstartError;
pub use identity::{GcpIamClient, IamApi};
pub use orchestrator::{Quickstart, QuickstartOutcome};
pub use secrets::{ConsoleSecretSource, SecretSource};
