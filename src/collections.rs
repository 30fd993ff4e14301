//! Collection fetchers for the three upstream endpoints
//!
//! These wrap [`ApiClient::fetch_records`](crate::client::ApiClient) with
//! the per-collection rules: the even-id filter for users and the
//! latest-N selection for posts and comments. Posts and comments are
//! filtered server-side through query parameters so only the relevant
//! slice of each collection crosses the wire.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{PostId, Record, UserId, field_i64};

impl ApiClient {
    /// Fetch all users and keep those with an even id
    ///
    /// Records without an integer `id` cannot qualify and are dropped.
    /// Fetch order is preserved for the survivors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`](crate::error::Error::Fetch) when the users
    /// endpoint stays unreachable through all retry attempts.
    pub async fn users(&self) -> Result<Vec<Record>> {
        let mut users = self.fetch_records(&self.users_url()).await?;
        users.retain(is_even_id);
        Ok(users)
    }

    /// Fetch a user's posts and keep the latest ones
    ///
    /// The posts endpoint is asked for this author only (`?userId=`), then
    /// the result is reduced to the configured number of latest posts,
    /// highest `id` first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`](crate::error::Error::Fetch) when the posts
    /// endpoint stays unreachable through all retry attempts.
    pub async fn latest_posts_for_user(&self, user: UserId) -> Result<Vec<Record>> {
        let posts = self.fetch_records(&self.posts_url(user)).await?;
        Ok(latest_by_id(posts, self.selection.posts_per_user))
    }

    /// Fetch a post's comments and keep the latest ones
    ///
    /// Same shape as [`latest_posts_for_user`](Self::latest_posts_for_user)
    /// with the comments endpoint, `?postId=`, and the comment cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`](crate::error::Error::Fetch) when the
    /// comments endpoint stays unreachable through all retry attempts.
    pub async fn latest_comments_for_post(&self, post: PostId) -> Result<Vec<Record>> {
        let comments = self.fetch_records(&self.comments_url(post)).await?;
        Ok(latest_by_id(comments, self.selection.comments_per_post))
    }
}

fn is_even_id(record: &Record) -> bool {
    field_i64(record, "id").is_some_and(|id| id % 2 == 0)
}

/// Sort records by `id` descending and keep the first `cap`
///
/// The sort is stable, so records sharing an id keep their fetch order.
/// Records without an integer id sort last.
fn latest_by_id(mut records: Vec<Record>, cap: usize) -> Vec<Record> {
    records.sort_by(|a, b| field_i64(b, "id").cmp(&field_i64(a, "id")));
    records.truncate(cap);
    records
}
