//! Configuration types for comment-report

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Upstream API settings (base URL, client timeout, user agent)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the content API (default: `https://jsonplaceholder.typicode.com`)
    ///
    /// The three collections are expected underneath it: `/users`, `/posts`
    /// (filterable by `userId`), and `/comments` (filterable by `postId`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout for the HTTP client (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry policy for transient fetch failures
///
/// Delays grow exponentially from `initial_delay` by `backoff_multiplier`
/// per attempt and are clamped to `max_delay`. With the defaults the ladder
/// is 4s, 8s, 10s, 10s, ...
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of fetch attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 4 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    ///
    /// Off by default so repeated runs retry on the same schedule; turn on
    /// when many instances hit the same upstream.
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Latest-N selection caps
///
/// "Latest" means highest `id`: the upstream assigns ids monotonically with
/// creation time, so sorting by `id` descending avoids depending on a
/// timestamp field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// How many of a user's most recent posts to consider (default: 5)
    #[serde(default = "default_posts_per_user")]
    pub posts_per_user: usize,

    /// How many of a post's most recent comments to consider (default: 3)
    #[serde(default = "default_comments_per_post")]
    pub comments_per_post: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            posts_per_user: default_posts_per_user(),
            comments_per_post: default_comments_per_post(),
        }
    }
}

/// Output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where to write the CSV report (default: `output.csv`)
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

/// Main configuration for a report run
///
/// Every field has a sensible default; `Config::default()` targets the
/// public JSONPlaceholder instance and writes `output.csv` next to the
/// process. TOML layout mirrors the struct nesting:
///
/// ```toml
/// [api]
/// base_url = "https://jsonplaceholder.typicode.com"
///
/// [retry]
/// max_attempts = 3
///
/// [selection]
/// posts_per_user = 5
/// comments_per_post = 3
///
/// [export]
/// output_path = "output.csv"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy for transient fetch failures
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Latest-N selection caps
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Output settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to their defaults, so a partial file is fine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is not valid
    /// TOML for this schema.
    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config file {}: {}", path.display(), e),
            key: None,
        })?;
        toml::from_str(&raw).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Parse and check the configured base URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse or uses a scheme
    /// other than http/https.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {:?}: {}", self.api.base_url, e),
            key: Some("api.base_url".to_string()),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("base URL must use http or https, got {:?}", url.scheme()),
                key: Some("api.base_url".to_string()),
            });
        }
        Ok(url)
    }

    /// Check the configuration for values that would make a run nonsensical
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("comment-report/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(4)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_posts_per_user() -> usize {
    5
}

fn default_comments_per_post() -> usize {
    3
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.csv")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
