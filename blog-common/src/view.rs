//! Template-facing shapes of the model.
//!
//! Everything here serializes into the plain nested mappings the page templates read.

use crate::model::{comment::Comment, post::Post, tag::Tag};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const TEASER_LEN: usize = 200;

/// Public URL prefix that uploaded images are served under.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(transparent)]
pub struct MediaUrl(String);

impl MediaUrl {
    #[must_use]
    pub fn new(prefix: String) -> Self {
        Self(prefix)
    }

    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let prefix = self.0.trim_end_matches('/');
        let path = path.trim_start_matches('/');

        format!("{prefix}/{path}")
    }
}

impl Default for MediaUrl {
    fn default() -> Self {
        Self("/media/".to_owned())
    }
}

/// Returns the first [`TEASER_LEN`] characters of `text`.
#[must_use]
pub fn teaser(text: &str) -> &str {
    match text.char_indices().nth(TEASER_LEN) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct TagSummary {
    pub title: String,
    pub posts_with_tag: u64,
}

impl From<&Tag> for TagSummary {
    fn from(tag: &Tag) -> Self {
        Self {
            title: tag.title.clone(),
            posts_with_tag: tag.posts_with_tag,
        }
    }
}

/// A post as shown in listings.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: u64,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub slug: String,
    pub tags: Vec<TagSummary>,
    /// Left out of the mapping entirely for untagged posts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_tag_title: Option<String>,
}

impl PostSummary {
    #[must_use]
    pub fn new(post: &Post, media: &MediaUrl) -> Self {
        Self {
            title: post.title.clone(),
            teaser_text: teaser(&post.text).to_owned(),
            author: post.author.username.get().to_owned(),
            comments_amount: post.comments_amount,
            image_url: post.image.as_deref().map(|image| media.url_for(image)),
            published_at: post.published_at,
            slug: post.slug.get().to_owned(),
            tags: post.tags.iter().map(TagSummary::from).collect(),
            first_tag_title: post.first_tag().map(|tag| tag.title.clone()),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct CommentView {
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub author: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            text: comment.text.clone(),
            published_at: comment.published_at,
            author: comment.author.username.get().to_owned(),
        }
    }
}

/// A post as shown on its own page, with the full text and its comments.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostDetail {
    pub title: String,
    pub text: String,
    pub author: String,
    pub comments: Vec<CommentView>,
    pub likes_amount: u64,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub slug: String,
    pub tags: Vec<TagSummary>,
}

impl PostDetail {
    #[must_use]
    pub fn new(post: &Post, comments: &[Comment], media: &MediaUrl) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            author: post.author.username.get().to_owned(),
            comments: comments.iter().map(CommentView::from).collect(),
            likes_amount: post.likes_amount,
            image_url: post.image.as_deref().map(|image| media.url_for(image)),
            published_at: post.published_at,
            slug: post.slug.get().to_owned(),
            tags: post.tags.iter().map(TagSummary::from).collect(),
        }
    }
}
