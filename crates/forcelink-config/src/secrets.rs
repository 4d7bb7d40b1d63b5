//! Secret resolution for passwords and signing keys.
//!
//! Resolution order for each secret:
//! 1. Environment variable
//! 2. Inline config value (with warning)
//! 3. For the private key only: `private_key_path`

use std::path::Path;

use tracing::debug;

use crate::{ConfigError, ConnectorConfig, Result};

/// Overrides the configured default password.
pub const PASSWORD_ENV: &str = "FORCELINK_PASSWORD";

/// Overrides the configured JWT signing key (PEM).
pub const PRIVATE_KEY_ENV: &str = "FORCELINK_PRIVATE_KEY";

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext).
    ConfigFile,
    /// Key file referenced by `private_key_path`.
    KeyFile(String),
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
            SecretSource::KeyFile(path) => write!(f, "key file {}", path),
        }
    }
}

/// Fill in secrets from the process environment and key files.
///
/// Returns the source of each secret that ended up set, keyed by field name.
pub fn resolve_secrets(config: &mut ConnectorConfig) -> Result<Vec<(&'static str, SecretSource)>> {
    resolve_secrets_with(config, |name| std::env::var(name).ok())
}

/// Like [`resolve_secrets`], reading variables through `lookup`.
pub fn resolve_secrets_with(
    config: &mut ConnectorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<(&'static str, SecretSource)>> {
    let env = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut resolved = Vec::new();

    if let Some(password) = env(PASSWORD_ENV) {
        config.password = Some(password);
        resolved.push(("password", SecretSource::EnvVar(PASSWORD_ENV.to_string())));
    } else if config.password.is_some() {
        resolved.push(("password", SecretSource::ConfigFile));
    }

    if let Some(key) = env(PRIVATE_KEY_ENV) {
        config.private_key = Some(key);
        resolved.push((
            "private_key",
            SecretSource::EnvVar(PRIVATE_KEY_ENV.to_string()),
        ));
    } else if config.private_key.is_some() {
        resolved.push(("private_key", SecretSource::ConfigFile));
    } else if let Some(path) = config.private_key_path.clone() {
        config.private_key = Some(read_key_file(&path)?);
        resolved.push((
            "private_key",
            SecretSource::KeyFile(path.display().to_string()),
        ));
    }

    for (field, source) in &resolved {
        debug!(field, %source, "Resolved secret");
    }
    Ok(resolved)
}

fn read_key_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })
}
