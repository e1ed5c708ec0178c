//! Admin SSH key pair
//!
//! Either shells out to `ssh-keygen` or generates an Ed25519 key in-process
//! with the `ssh-key` crate.

use crate::command::{CommandRunner, Invocation};
use crate::config::SshKeyBackend;
use crate::error::QuickstartError;
use crate::identity::write_private_file;
use anyhow::{Context, Result};
use rand::rngs::OsRng;
use ssh_key::{private::Ed25519Keypair, HashAlg, LineEnding, PrivateKey};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const KEY_COMMENT: &str = "cam-admin";

/// Path of the public half for a private key path
pub fn public_key_path(private_key: &Path) -> PathBuf {
    let mut name = private_key.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

/// Create the admin key pair at `path` (private) and `path.pub` (public)
///
/// The `ssh-keygen` backend inherits the terminal, so an existing key
/// triggers its own overwrite prompt. The native backend overwrites.
pub async fn generate_ssh_key_pair(
    runner: &dyn CommandRunner,
    backend: SshKeyBackend,
    path: &Path,
) -> Result<()> {
    info!(backend = %backend, path = %path.display(), "🔐 Creating SSH key...");

    match backend {
        SshKeyBackend::SshKeygen => {
            let invocation = Invocation::new("ssh-keygen").args([
                "-f".to_string(),
                path.display().to_string(),
                "-t".to_string(),
                "rsa".to_string(),
                "-q".to_string(),
                "-N".to_string(),
                String::new(),
            ]);

            let status = runner.status(&invocation).await?;
            if !status.success() {
                return Err(QuickstartError::CommandFailed {
                    command: invocation.to_string(),
                    status: status.to_string(),
                }
                .into());
            }
        }
        SshKeyBackend::Native => {
            warn!(
                path = %path.display(),
                "Native backend writes an Ed25519 key under the RSA key file name"
            );

            let mut key = PrivateKey::from(Ed25519Keypair::random(&mut OsRng));
            key.set_comment(KEY_COMMENT);

            let private = key
                .to_openssh(LineEnding::LF)
                .context("Failed to encode SSH private key")?;
            write_private_file(path, private.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            let public = key
                .public_key()
                .to_openssh()
                .context("Failed to encode SSH public key")?;
            let public_path = public_key_path(path);
            tokio::fs::write(&public_path, format!("{}\n", public))
                .await
                .with_context(|| format!("Failed to write {}", public_path.display()))?;

            info!(
                fingerprint = %key.fingerprint(HashAlg::Sha256),
                "SSH key pair written"
            );
        }
    }

    Ok(())
}
