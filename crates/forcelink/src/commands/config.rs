//! Config command - inspect the resolved configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use forcelink_config::LayerStatus;
use serde_json::{Value, json};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration with secrets redacted
    Show,

    /// Show which config files are checked and which were loaded
    Which,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let mut value = serde_json::to_value(&config)?;
    redact(&mut value, &["password", "private_key"]);
    if let Some(oauth2) = value.get_mut("oauth2") {
        redact(oauth2, &["client_secret"]);
    }
    value["session_ttl_ms"] = json!(config.session_ttl().as_millis() as u64);
    ctx.print(&value)
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let layers: Vec<Value> = loaded
        .layers
        .iter()
        .map(|layer| {
            let mut entry = json!({
                "layer": layer.kind.to_string(),
                "path": layer.path.display().to_string(),
                "loaded": layer.is_loaded(),
            });
            if let LayerStatus::Skipped(reason) = &layer.status {
                entry["skipped"] = json!(reason);
            }
            entry
        })
        .collect();
    ctx.print(&json!({ "layers": layers, "warnings": loaded.warnings }))
}

fn redact(value: &mut Value, keys: &[&str]) {
    for key in keys {
        if let Some(field) = value.get_mut(*key)
            && !field.is_null()
        {
            *field = json!("[redacted]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_only_set_fields() {
        let mut value = json!({ "username": "a@x.com", "password": "p1", "private_key": null });
        redact(&mut value, &["password", "private_key"]);
        assert_eq!(
            value,
            json!({ "username": "a@x.com", "password": "[redacted]", "private_key": null })
        );
    }
}
