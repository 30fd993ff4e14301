//! Basic report example
//!
//! This example demonstrates the core functionality of comment-report:
//! - Building a configuration with custom selection caps
//! - Running the full fetch-validate-join pipeline
//! - Inspecting the run summary

use comment_report::config::{Config, SelectionConfig};
use comment_report::run;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log fetch progress to stderr
    tracing_subscriber::fmt::init();

    // Build configuration: public JSONPlaceholder API, smaller post cap
    let config = Config {
        selection: SelectionConfig {
            posts_per_user: 2,
            comments_per_post: 3,
        },
        ..Default::default()
    };

    // Run the pipeline end to end
    let summary = run(&config).await?;

    println!(
        "✓ {} qualifying users produced {} report rows",
        summary.qualifying_users, summary.rows
    );
    match summary.output {
        Some(path) => println!("✓ Report written to {}", path.display()),
        None => println!("✗ No rows, nothing written"),
    }

    Ok(())
}
