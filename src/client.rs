//! HTTP client for the content API
//!
//! One [`ApiClient`] is created per run and shared by every fetch; the
//! underlying reqwest client pools connections across the concurrent
//! requests. All fetches go through [`ApiClient::fetch_records`], which
//! applies the configured retry policy and wraps exhaustion in
//! [`Error::Fetch`].

use crate::config::{Config, RetryPolicy, SelectionConfig};
use crate::error::{Error, Result};
use crate::retry::fetch_with_retry;
use crate::types::{PostId, Record, UserId};
use url::Url;

/// Client for the upstream content API
///
/// Holds the shared HTTP connection pool plus the retry policy and
/// selection caps that apply to every fetch made through it.
#[derive(Debug)]
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base: Url,
    pub(crate) retry: RetryPolicy,
    pub(crate) selection: SelectionConfig,
}

impl ApiClient {
    /// Create a client from the run configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unusable base URL and
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let base = config.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout)
            .user_agent(&config.api.user_agent)
            .build()?;

        Ok(Self {
            http,
            base,
            retry: config.retry.clone(),
            selection: config.selection.clone(),
        })
    }

    /// Build the URL for a collection endpoint under the base URL
    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        // http/https URLs always have path segments, checked at config time
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    /// URL of the users collection
    pub(crate) fn users_url(&self) -> Url {
        self.endpoint("users")
    }

    /// URL of the posts collection, filtered server-side to one author
    pub(crate) fn posts_url(&self, user: UserId) -> Url {
        let mut url = self.endpoint("posts");
        url.query_pairs_mut()
            .append_pair("userId", &user.to_string());
        url
    }

    /// URL of the comments collection, filtered server-side to one post
    pub(crate) fn comments_url(&self, post: PostId) -> Url {
        let mut url = self.endpoint("comments");
        url.query_pairs_mut()
            .append_pair("postId", &post.to_string());
        url
    }

    /// One fetch attempt: GET the URL, require a success status, decode the
    /// body as a JSON array of objects
    async fn fetch_once(&self, url: &Url) -> Result<Vec<Record>> {
        tracing::info!(url = %url, "Fetching data");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let records: Vec<Record> = serde_json::from_str(&body).map_err(|e| Error::Decode {
            url: url.to_string(),
            source: e,
        })?;

        tracing::info!(url = %url, records = records.len(), "Successfully fetched data");
        Ok(records)
    }

    /// Fetch a collection with the configured retry policy
    ///
    /// Transient failures are retried per the policy; once attempts are
    /// exhausted the last error comes back wrapped in [`Error::Fetch`] so
    /// callers can tell a failed endpoint from a failed attempt.
    pub(crate) async fn fetch_records(&self, url: &Url) -> Result<Vec<Record>> {
        fetch_with_retry(&self.retry, || self.fetch_once(url))
            .await
            .map_err(|e| Error::fetch_exhausted(url.to_string(), e))
    }
}
