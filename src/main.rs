//! comment-report - Main entry point
//!
//! Thin CLI wrapper around the comment_report library: loads
//! configuration, applies command-line overrides, runs the pipeline
//! once, and reports the outcome.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comment_report::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for comment-report
#[derive(Parser, Debug)]
#[command(name = "comment-report")]
#[command(about = "Fetch users, posts, and comments into a CSV report")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "COMMENT_REPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the content API (overrides the config file)
    #[arg(short, long, env = "COMMENT_REPORT_BASE_URL")]
    base_url: Option<String>,

    /// Where to write the CSV report (overrides the config file)
    #[arg(short, long, env = "COMMENT_REPORT_OUTPUT")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comment_report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_toml_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    if let Some(output) = args.output {
        config.export.output_path = output;
    }

    info!("Starting report run against {}", config.api.base_url);

    let summary = comment_report::run(&config)
        .await
        .context("Report run failed")?;

    match &summary.output {
        Some(path) => info!(
            "Wrote {} rows from {} qualifying users to {}",
            summary.rows,
            summary.qualifying_users,
            path.display()
        ),
        None => info!(
            "No rows to write ({} qualifying users)",
            summary.qualifying_users
        ),
    }

    Ok(())
}
