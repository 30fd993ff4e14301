//! # comment-report
//!
//! Concurrent fetch-validate-join pipeline that turns three REST
//! collections (users, posts, comments) into a flat CSV report of the
//! latest comments on the latest posts of even-id users.
//!
//! ## Design Philosophy
//!
//! comment-report is designed to be:
//! - **Skip bad records, fail dead endpoints** - A record missing a field
//!   is logged and dropped; an endpoint that stays unreachable through all
//!   retries aborts the run
//! - **Sensible defaults** - Works against the public JSONPlaceholder API
//!   with zero configuration
//! - **Library-first** - The bundled binary is a thin CLI over [`run`]
//! - **Deterministic output** - The same upstream data produces the same
//!   bytes, however the concurrent fetches interleave
//!
//! ## Quick Start
//!
//! ```no_run
//! use comment_report::{Config, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     let summary = run(&config).await?;
//!     println!(
//!         "{} rows from {} qualifying users",
//!         summary.rows, summary.qualifying_users
//!     );
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the content API
pub mod client;
/// Collection fetchers (users, latest posts, latest comments)
pub mod collections;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// CSV export
pub mod export;
/// The fetch-validate-join pipeline
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// Presence validation for raw records
pub mod validate;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{ApiConfig, Config, ExportConfig, RetryPolicy, SelectionConfig};
pub use error::{Error, Result};
pub use pipeline::{Report, build_report, process_user};
pub use types::{PostId, Record, ReportRow, RunSummary, UserId};

/// Run the whole pipeline: fetch, validate, join, export
///
/// Builds one shared HTTP client, assembles the report through it, and
/// writes the CSV. The client is dropped before the export so no
/// connection outlives the fetching phase, on success and on failure
/// alike. An empty report writes no file; [`RunSummary::output`] is `None`
/// in that case.
///
/// # Errors
///
/// Returns [`Error::Config`] for unusable configuration, [`Error::Fetch`]
/// when an endpoint stays unreachable through all retries, and
/// [`Error::Csv`] or [`Error::Io`] when the export fails.
///
/// # Example
///
/// ```no_run
/// use comment_report::{Config, run};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut config = Config::default();
///     config.export.output_path = "report.csv".into();
///
///     let summary = run(&config).await?;
///     if let Some(path) = &summary.output {
///         println!("wrote {} rows to {}", summary.rows, path.display());
///     }
///
///     Ok(())
/// }
/// ```
pub async fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;

    let report = {
        let client = ApiClient::new(config)?;
        pipeline::build_report(&client).await?
    };
    // client dropped above: fetching is over before the report touches disk

    let written = export::write_report(&report.rows, &config.export.output_path)?;

    let summary = RunSummary {
        qualifying_users: report.qualifying_users,
        rows: report.rows.len(),
        output: written.then(|| config.export.output_path.clone()),
    };
    tracing::info!(
        qualifying_users = summary.qualifying_users,
        rows = summary.rows,
        "Report run complete"
    );
    Ok(summary)
}
