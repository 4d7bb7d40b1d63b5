//! forcelink - session-caching Salesforce client
//!
//! Main entry point for the forcelink CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, config, records};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// forcelink - session-caching Salesforce client
#[derive(Parser)]
#[command(name = "forcelink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file layered over the discovered configuration
    #[arg(short, long, global = true, env = "FORCELINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use the sandbox login endpoint
    #[arg(long, global = true)]
    pub sandbox: bool,

    /// Print compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print the auth token
    Auth(auth::AuthArgs),

    /// Run a SOQL query
    Query(records::QueryArgs),

    /// Find records matching a condition object
    Find(records::FindArgs),

    /// Describe an object
    Describe(records::DescribeArgs),

    /// List every object in the org
    DescribeGlobal,

    /// Create records
    Create(records::RecordArgs),

    /// Update records (each must carry its Id)
    Update(records::RecordArgs),

    /// Insert or update records by external id
    Upsert(records::UpsertArgs),

    /// Delete records by id
    Delete(records::RecordArgs),

    /// Configuration inspection
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: human-readable console plus a rotating JSON file
    let filter = if cli.verbose {
        "forcelink=debug,forcelink_connector=debug,forcelink_client=debug,forcelink_oauth=debug,forcelink_session=debug,forcelink_config=debug,info"
    } else {
        "forcelink=info,forcelink_connector=info,forcelink_client=info,forcelink_oauth=info,warn"
    };

    let log_dir = forcelink_config::config_home()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "forcelink.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "forcelink=trace,forcelink_connector=trace,forcelink_client=trace,forcelink_oauth=trace,forcelink_session=trace,forcelink_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        config_path: cli.config,
        sandbox: cli.sandbox,
        compact: cli.compact,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Query(args) => records::query(args, &ctx).await,
        Commands::Find(args) => records::find(args, &ctx).await,
        Commands::Describe(args) => records::describe(args, &ctx).await,
        Commands::DescribeGlobal => records::describe_global(&ctx).await,
        Commands::Create(args) => records::create(args, &ctx).await,
        Commands::Update(args) => records::update(args, &ctx).await,
        Commands::Upsert(args) => records::upsert(args, &ctx).await,
        Commands::Delete(args) => records::delete(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
