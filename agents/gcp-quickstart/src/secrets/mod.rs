//! Local secret material: the deployment secrets directory, the admin SSH
//! key pair and operator prompts.

pub mod prompt;
pub mod ssh;

pub use prompt::{ConsoleSecretSource, SecretSource};
pub use ssh::generate_ssh_key_pair;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Create the secrets directory with mode 0700
///
/// An existing directory is left as it is.
pub fn ensure_secrets_dir(path: &Path) -> Result<()> {
    info!(path = %path.display(), "📁 Creating directory to store secrets...");

    let mut builder = std::fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    match builder.create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            info!(path = %path.display(), "Directory already exists");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to create {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("secrets");

        ensure_secrets_dir(&secrets).unwrap();
        std::fs::write(secrets.join("keep"), "x").unwrap();
        ensure_secrets_dir(&secrets).unwrap();

        assert!(secrets.join("keep").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&secrets).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("no/such/parent/secrets");
        assert!(ensure_secrets_dir(&nested).is_err());
    }
}
