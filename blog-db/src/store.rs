use async_trait::async_trait;
use blog_common::model::{
    Id, ModelValidationError,
    comment::Comment,
    post::{Post, PostMarker, Slug},
    tag::{Tag, TagMarker},
};
use std::fmt::Debug;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Applying migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Read access to posts, tags and comments.
///
/// Every post handed out has its author and tags attached and its like and comment counts
/// computed from the underlying relations.
#[async_trait]
pub trait BlogStore: Send + Sync + Debug {
    /// Posts with the most likes first, ties broken by id.
    async fn fetch_popular_posts(&self, limit: u32) -> Result<Vec<Post>>;

    /// Most recently published posts first, ties broken by id.
    async fn fetch_fresh_posts(&self, limit: u32) -> Result<Vec<Post>>;

    async fn fetch_post_by_slug(&self, slug: &Slug) -> Result<Option<Post>>;

    /// Comments in publication order.
    async fn fetch_comments_for_post(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    /// Tags used by the most posts first, ties broken by id.
    async fn fetch_popular_tags(&self, limit: u32) -> Result<Vec<Tag>>;

    async fn fetch_tag_by_title(&self, title: &str) -> Result<Option<Tag>>;

    /// Posts carrying the tag, most recently published first.
    async fn fetch_posts_for_tag(&self, tag_id: Id<TagMarker>, limit: u32) -> Result<Vec<Post>>;
}
