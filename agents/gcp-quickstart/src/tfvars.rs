//! Terraform variables file rendering
//!
//! `terraform.tfvars` is produced from `terraform.tfvars.sample`: comment and
//! blank lines are copied, every other line names a required variable whose
//! value must be present in [`Settings`]. The file is written once and never
//! overwritten.

use crate::config::{DeploymentLayout, QuickstartConfig};
use crate::error::QuickstartError;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolved variable values keyed by variable name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (k, v) in iter {
            settings.set(k, v);
        }
        settings
    }
}

/// Values collected by earlier steps that feed the variables file
#[derive(Debug, Clone)]
pub struct DeploymentInputs<'a> {
    pub password: &'a str,
    pub registration_code: &'a str,
    pub connector_token: &'a str,
}

/// Settings for the `dc-cac-ws` deployment
///
/// Paths are relative to the deployment directory. Workstation counts
/// start at zero.
pub fn deployment_settings(config: &QuickstartConfig, inputs: &DeploymentInputs<'_>) -> Settings {
    let ssh_private = DeploymentLayout::ssh_private_key_rel();
    let ssh_public = DeploymentLayout::ssh_public_key_rel();

    let mut settings = Settings::new();
    settings
        .set("gcp_credentials_file", DeploymentLayout::service_account_key_rel())
        .set("gcp_project_id", &config.project_id)
        .set("dc_admin_password", inputs.password)
        .set("safe_mode_admin_password", inputs.password)
        .set("service_account_password", inputs.password)
        .set("cac_admin_ssh_pub_key_file", &ssh_public)
        .set("cac_admin_ssh_priv_key_file", &ssh_private)
        .set("win_gfx_instance_count", 0)
        .set("centos_gfx_instance_count", 0)
        .set("centos_std_instance_count", 0)
        .set("centos_admin_ssh_pub_key_file", &ssh_public)
        .set("centos_admin_ssh_priv_key_file", &ssh_private)
        .set("pcoip_registration_code", inputs.registration_code)
        .set("cac_token", inputs.connector_token);
    settings
}

/// Path of the sample a variables file is derived from
pub fn sample_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sample");
    PathBuf::from(name)
}

fn is_passthrough(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('\n')
}

/// Key of a variable line: the text before the first `=`, trimmed
fn line_key(line: &str) -> &str {
    line.split('=').next().unwrap_or_default().trim()
}

/// Render `path` from `path.sample` using `settings`
///
/// Fails with `VariablesFileExists` before touching anything when `path` is
/// already present, and with `MissingSetting` (after removing the partial
/// output) when a variable has no value.
pub fn create_tf_vars(path: &Path, settings: &Settings) -> Result<()> {
    info!(path = %path.display(), "📝 Creating variables file...");

    if path.exists() {
        return Err(QuickstartError::VariablesFileExists(path.to_path_buf()).into());
    }

    let sample = sample_path(path);
    let template = fs::read_to_string(&sample)
        .with_context(|| format!("Failed to read {}", sample.display()))?;

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                anyhow::Error::from(QuickstartError::VariablesFileExists(path.to_path_buf()))
            } else {
                anyhow::Error::new(e).context(format!("Failed to create {}", path.display()))
            }
        })?;

    let result = write_rendered(BufWriter::new(file), &template, settings, path);
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove partial variables file");
        }
    }
    result?;

    info!(path = %path.display(), "Variables file created");
    Ok(())
}

fn write_rendered<W: Write>(
    mut out: W,
    template: &str,
    settings: &Settings,
    path: &Path,
) -> Result<()> {
    // Samples edited on Windows render like their LF counterparts
    let template = template.replace("\r\n", "\n");

    for line in template.split_inclusive('\n') {
        if is_passthrough(line) {
            out.write_all(line.as_bytes())?;
            continue;
        }

        let key = line_key(line);
        let value = settings.get(key).ok_or_else(|| QuickstartError::MissingSetting {
            key: key.to_string(),
            path: path.to_path_buf(),
        })?;
        writeln!(out, "{} = \"{}\"", key, value)?;
    }

    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
