//! CLI command handlers.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use forcelink_config::{ConnectorConfig, Discovered, Discovery};
use forcelink_connector::Connector;
use serde_json::Value;
use tracing::{debug, warn};

pub mod auth;
pub mod config;
pub mod records;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file, layered last.
    pub config_path: Option<PathBuf>,
    /// Force the sandbox login endpoint.
    pub sandbox: bool,
    /// Print compact JSON.
    pub compact: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Discover, layer and resolve the configuration.
    pub fn load(&self) -> Result<Discovered> {
        let mut discovery = Discovery::new();
        if let Some(path) = &self.config_path {
            discovery = discovery.explicit_file(path);
        }
        let mut loaded = discovery.load()?;
        if self.sandbox {
            loaded.config.is_sandbox = Some(true);
        }
        for warning in &loaded.warnings {
            warn!("{}", warning);
        }

        let resolved = forcelink_config::resolve_secrets(&mut loaded.config)?;
        for (name, source) in resolved {
            debug!(secret = name, source = ?source, "Secret resolved");
        }
        Ok(loaded)
    }

    /// Resolved configuration only.
    pub fn config(&self) -> Result<ConnectorConfig> {
        Ok(self.load()?.config)
    }

    /// Build a connector from the resolved configuration.
    pub fn connector(&self) -> Result<Connector> {
        Ok(Connector::new(self.config()?)?)
    }

    /// Print a JSON value to stdout.
    pub fn print(&self, value: &Value) -> Result<()> {
        let out = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        println!("{}", out);
        Ok(())
    }
}

/// Run one connector call, close the connector and print the result.
///
/// The connector is closed whether or not the call succeeded, so no session
/// outlives the command.
pub async fn run_with_connector<F, Fut>(ctx: &Context, call: F) -> Result<()>
where
    F: FnOnce(Connector) -> Fut,
    Fut: Future<Output = forcelink_connector::Result<Value>>,
{
    let connector = ctx.connector()?;
    let result = call(connector.clone()).await;
    let closed = connector.close().await;
    debug!(sessions = closed, "Connector closed");

    ctx.print(&result?)
}

/// Parse a JSON argument; `@path` reads the JSON from a file.
pub fn parse_json(arg: &str) -> Result<Value> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let contents = std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("failed to read {}", path))?;
            serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path))
        }
        None => serde_json::from_str(arg).context("invalid JSON argument"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_inline_and_file() {
        assert_eq!(
            parse_json(r#"{"Name":"Acme"}"#).unwrap(),
            serde_json::json!({ "Name": "Acme" })
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, r#"[{"Id":"001A"}]"#).unwrap();
        let value = parse_json(&format!("@{}", path.display())).unwrap();
        assert!(value.is_array());

        assert!(parse_json("{not json").is_err());
    }
}
