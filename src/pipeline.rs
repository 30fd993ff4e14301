//! The fetch-validate-join pipeline
//!
//! [`build_report`] drives one run: fetch the qualifying users, process
//! them concurrently, and flatten the per-user results into report rows.
//! Processing a user means fetching their latest posts, fetching the
//! latest comments of every valid post (also concurrently), and joining
//! user, post, and comment fields into [`ReportRow`]s.
//!
//! Two failure modes are kept strictly apart. A record that fails
//! validation or carries a wrongly typed field is logged and skipped, and
//! the run continues without it. A fetch that exhausts its retries aborts
//! the whole run, cancelling whatever is still in flight.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{PostId, Record, ReportRow, UserId, field_i64, field_str};
use crate::validate::{
    COMMENT_REQUIRED_FIELDS, POST_REQUIRED_FIELDS, USER_REQUIRED_FIELDS, validate_record,
};
use futures::future;

/// Assembled report data, ready for export
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// Number of users that passed the even-id filter
    pub qualifying_users: usize,
    /// All report rows, grouped by user in fetch order
    pub rows: Vec<ReportRow>,
}

/// Build the full report through one shared client
///
/// Users are processed concurrently; the result keeps them in fetch
/// order regardless of which finished first.
///
/// # Errors
///
/// Returns the first [`Error::Fetch`](crate::error::Error::Fetch) any
/// fetch produced. Sibling work still in flight is cancelled.
pub async fn build_report(client: &ApiClient) -> Result<Report> {
    let users = client.users().await?;
    tracing::info!(qualifying_users = users.len(), "Processing users");

    let row_batches =
        future::try_join_all(users.iter().map(|user| process_user(client, user))).await?;

    Ok(Report {
        qualifying_users: users.len(),
        rows: row_batches.into_iter().flatten().collect(),
    })
}

/// Produce the report rows contributed by one user
///
/// An invalid or wrongly typed user record yields no rows and no further
/// fetches. Valid posts have their comments fetched concurrently, and the
/// rows come out ordered: latest post first, latest comment first within
/// each post.
///
/// # Errors
///
/// Returns [`Error::Fetch`](crate::error::Error::Fetch) when a posts or
/// comments fetch exhausts its retries.
pub async fn process_user(client: &ApiClient, user: &Record) -> Result<Vec<ReportRow>> {
    if !validate_record(user, USER_REQUIRED_FIELDS) {
        return Ok(Vec::new());
    }
    let Some(user_id) = field_i64(user, "id") else {
        tracing::warn!(record = ?user, "User id is not an integer, skipping user");
        return Ok(Vec::new());
    };
    let Some(user_name) = field_str(user, "name") else {
        tracing::warn!(record = ?user, "User name is not a string, skipping user");
        return Ok(Vec::new());
    };

    let posts = client.latest_posts_for_user(UserId(user_id)).await?;

    // Validate posts up front so only the valid ones cost a comments fetch
    let mut valid_posts: Vec<(PostId, &str)> = Vec::with_capacity(posts.len());
    for post in &posts {
        if !validate_record(post, POST_REQUIRED_FIELDS) {
            continue;
        }
        let Some(post_id) = field_i64(post, "id") else {
            tracing::warn!(record = ?post, "Post id is not an integer, skipping post");
            continue;
        };
        let Some(title) = field_str(post, "title") else {
            tracing::warn!(record = ?post, "Post title is not a string, skipping post");
            continue;
        };
        valid_posts.push((PostId(post_id), title));
    }

    let comment_batches = future::try_join_all(
        valid_posts
            .iter()
            .map(|(post_id, _)| client.latest_comments_for_post(*post_id)),
    )
    .await?;

    let mut rows = Vec::new();
    for ((post_id, post_title), comments) in valid_posts.iter().zip(comment_batches) {
        for comment in comments {
            if !validate_record(&comment, COMMENT_REQUIRED_FIELDS) {
                continue;
            }
            let Some(comment_id) = field_i64(&comment, "id") else {
                tracing::warn!(record = ?comment, "Comment id is not an integer, skipping comment");
                continue;
            };
            let Some(comment_body) = field_str(&comment, "body") else {
                tracing::warn!(record = ?comment, "Comment body is not a string, skipping comment");
                continue;
            };
            let Some(comment_author_email) = field_str(&comment, "email") else {
                tracing::warn!(record = ?comment, "Comment email is not a string, skipping comment");
                continue;
            };

            rows.push(ReportRow {
                user_id,
                user_name: user_name.to_string(),
                post_id: post_id.0,
                post_title: (*post_title).to_string(),
                comment_id,
                comment_body: comment_body.to_string(),
                comment_author_email: comment_author_email.to_string(),
            });
        }
    }

    Ok(rows)
}
