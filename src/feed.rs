// File: ./src/feed.rs
//! The source side: where run announcements are read from and replied to.
use crate::error::FeedError;
use crate::model::SourcePost;

/// A comment left under a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub body: String,
}

#[allow(async_fn_in_trait)]
pub trait SourceFeed {
    /// Newest posts first, at most `limit` of them.
    async fn list_recent(&self, limit: usize) -> Result<Vec<SourcePost>, FeedError>;

    /// The first top-level reply under `post` written by `identity`.
    async fn post_has_reply_from(
        &self,
        post: &SourcePost,
        identity: &str,
    ) -> Result<Option<Reply>, FeedError>;

    async fn submit_reply(&self, post: &SourcePost, text: &str) -> Result<(), FeedError>;

    async fn edit_reply(&self, reply: &Reply, text: &str) -> Result<(), FeedError>;

    /// Why the post was taken down, or `None` while it is still live.
    async fn get_removal_status(&self, external_id: &str) -> Result<Option<String>, FeedError>;
}
