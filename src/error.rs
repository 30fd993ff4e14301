//! Error types for comment-report
//!
//! One `thiserror` enum covers both sides of a run: the fetch boundary
//! (transport failures, non-2xx statuses, undecodable bodies, exhausted
//! retries) and the writer side (CSV serialization, file I/O). Validation
//! failures are deliberately NOT errors — they are boolean skip signals
//! handled inline by the pipeline (see [`crate::validate`]).

use thiserror::Error;

/// Result type alias for comment-report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for comment-report
///
/// Fetch-boundary variants carry the request URL so a failed run names the
/// collection that broke it.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.base_url")
        key: Option<String>,
    },

    /// Network/transport error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP status {status} from {url}")]
    Status {
        /// The URL that was requested
        url: String,
        /// The response status code
        status: u16,
    },

    /// The response body was not the expected JSON array of objects
    #[error("invalid response body from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode
        url: String,
        /// The underlying JSON parse error
        source: serde_json::Error,
    },

    /// All fetch attempts for a URL were exhausted
    ///
    /// This is the fatal form of a fetch failure: the retry policy gave up
    /// and the error propagates to the top of the run. `source` is the last
    /// underlying failure (transport, status, or decode).
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        /// The URL that could not be fetched
        url: String,
        /// The last underlying error before giving up
        source: Box<Error>,
    },

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a terminal fetch failure with the URL it occurred on
    pub(crate) fn fetch_exhausted(url: impl Into<String>, source: Error) -> Self {
        Error::Fetch {
            url: url.into(),
            source: Box::new(source),
        }
    }
}
