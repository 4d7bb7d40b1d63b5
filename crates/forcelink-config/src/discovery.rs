//! Finding and layering config files.
//!
//! Layers, lowest precedence first:
//! 1. the user file, `config.toml` in the config home (`FORCELINK_CONFIG_DIR`,
//!    else `<platform config dir>/forcelink`)
//! 2. the project file, `forcelink.toml` in the project directory
//! 3. an explicit file named on the command line
//!
//! A missing user or project file is skipped silently, and one that cannot be
//! read or parsed is skipped with a warning. An explicit file must load.
//! Environment secrets are applied afterwards by [`crate::resolve_secrets`].

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, ConnectorConfig, Result};

const PROJECT_FILE: &str = "forcelink.toml";
const USER_FILE: &str = "config.toml";
const CONFIG_HOME_ENV: &str = "FORCELINK_CONFIG_DIR";

/// Which layer a config file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    User,
    Project,
    Explicit,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerKind::User => "user",
            LayerKind::Project => "project",
            LayerKind::Explicit => "explicit",
        })
    }
}

/// What happened to a candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStatus {
    Missing,
    Loaded,
    /// Present but unusable; holds the reason.
    Skipped(String),
}

/// One candidate config file and its outcome.
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub path: PathBuf,
    pub status: LayerStatus,
}

impl Layer {
    pub fn is_loaded(&self) -> bool {
        self.status == LayerStatus::Loaded
    }
}

/// The merged config and a report of how it was built.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub config: ConnectorConfig,
    /// Every candidate, lowest precedence first.
    pub layers: Vec<Layer>,
    pub warnings: Vec<String>,
}

impl Discovered {
    /// Paths of the layers that contributed to `config`.
    pub fn loaded_paths(&self) -> Vec<&Path> {
        self.layers
            .iter()
            .filter(|layer| layer.is_loaded())
            .map(|layer| layer.path.as_path())
            .collect()
    }
}

/// Builder describing where to look for config files.
#[derive(Debug, Clone)]
pub struct Discovery {
    config_home: Option<PathBuf>,
    project_dir: PathBuf,
    explicit: Option<PathBuf>,
}

impl Discovery {
    /// Look in the default config home and the current directory.
    pub fn new() -> Self {
        Self {
            config_home: config_home(),
            project_dir: PathBuf::from("."),
            explicit: None,
        }
    }

    /// Read the user file from `dir` instead of the default config home.
    pub fn config_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_home = Some(dir.into());
        self
    }

    pub fn project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    /// Layer `path` over everything else. It must exist and parse.
    pub fn explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    fn candidates(&self) -> Vec<(LayerKind, PathBuf)> {
        let mut candidates = Vec::with_capacity(3);
        if let Some(home) = &self.config_home {
            candidates.push((LayerKind::User, home.join(USER_FILE)));
        }
        candidates.push((LayerKind::Project, self.project_dir.join(PROJECT_FILE)));
        if let Some(path) = &self.explicit {
            candidates.push((LayerKind::Explicit, path.clone()));
        }
        candidates
    }

    /// Read and merge every layer.
    pub fn load(&self) -> Result<Discovered> {
        let mut config = ConnectorConfig::new();
        let mut layers = Vec::new();
        let mut warnings = Vec::new();

        for (kind, path) in self.candidates() {
            let status = if kind == LayerKind::Explicit {
                config.merge(read_config_file(&path)?);
                LayerStatus::Loaded
            } else if !path.is_file() {
                LayerStatus::Missing
            } else {
                match read_config_file(&path) {
                    Ok(layer) => {
                        config.merge(layer);
                        LayerStatus::Loaded
                    }
                    Err(e) => {
                        warnings.push(format!(
                            "Skipping {} config {}: {}",
                            kind,
                            path.display(),
                            e
                        ));
                        LayerStatus::Skipped(e.to_string())
                    }
                }
            };
            debug!(layer = %kind, path = %path.display(), ?status, "Config layer");
            layers.push(Layer { kind, path, status });
        }

        warnings.extend(plaintext_secret_warnings(&config));
        Ok(Discovered {
            config,
            layers,
            warnings,
        })
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one config file.
pub fn read_config_file(path: &Path) -> Result<ConnectorConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    ConnectorConfig::from_toml(&contents)
}

/// Directory holding the user config file and the CLI logs.
pub fn config_home() -> Option<PathBuf> {
    match std::env::var(CONFIG_HOME_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("forcelink")),
    }
}

fn plaintext_secret_warnings(config: &ConnectorConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.password.is_some() {
        warnings.push("Config holds a plaintext password; prefer FORCELINK_PASSWORD.".to_string());
    }
    if config.private_key.is_some() {
        warnings.push(
            "Config holds an inline private key; prefer private_key_path or FORCELINK_PRIVATE_KEY."
                .to_string(),
        );
    }
    warnings
}
