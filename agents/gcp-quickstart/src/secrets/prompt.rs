//! Operator-supplied secrets

use crate::config::PresetSecrets;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Where the three operator secrets come from
///
/// Values are trimmed; empty input is returned as-is.
pub trait SecretSource: Send + Sync {
    /// Cloud Access Manager auth token (echoed)
    fn auth_token(&self) -> Result<String>;

    /// PCoIP registration code (echoed)
    fn registration_code(&self) -> Result<String>;

    /// Active Directory password (masked)
    fn password(&self) -> Result<String>;
}

/// Prompts on the terminal unless a value was preset from flags or the environment
#[derive(Debug, Default)]
pub struct ConsoleSecretSource {
    presets: PresetSecrets,
}

impl ConsoleSecretSource {
    pub fn new(presets: PresetSecrets) -> Self {
        Self { presets }
    }

    fn read_line(prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok(line.trim().to_string())
    }
}

impl SecretSource for ConsoleSecretSource {
    fn auth_token(&self) -> Result<String> {
        match &self.presets.auth_token {
            Some(token) => Ok(token.trim().to_string()),
            None => Self::read_line("Paste the auth_token here:"),
        }
    }

    fn registration_code(&self) -> Result<String> {
        match &self.presets.registration_code {
            Some(code) => Ok(code.trim().to_string()),
            None => Self::read_line("Enter PCoIP Registration Code:"),
        }
    }

    fn password(&self) -> Result<String> {
        match &self.presets.password {
            Some(password) => Ok(password.trim().to_string()),
            None => {
                let password = rpassword::prompt_password("Enter password for Active Directory:")
                    .context("Failed to read password")?;
                Ok(password.trim().to_string())
            }
        }
    }
}
