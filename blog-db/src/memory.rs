//! An in-process [`BlogStore`] that keeps plain rows and derives every count on read.

use crate::store::{BlogStore, Result};
use async_trait::async_trait;
use blog_common::model::{
    Id,
    comment::{Comment, CommentMarker},
    post::{Post, PostMarker, Slug},
    tag::{Tag, TagMarker},
    user::{User, UserMarker, Username},
};
use std::{cmp::Reverse, collections::BTreeSet};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum MemoryStoreError {
    #[error("Username {0:?} is already taken")]
    DuplicateUsername(String),
    #[error("Slug {0:?} is already taken")]
    DuplicateSlug(String),
    #[error("Tag {0:?} already exists")]
    DuplicateTag(String),
    #[error("No user with id {0}")]
    UnknownUser(Id<UserMarker>),
    #[error("No post with id {0}")]
    UnknownPost(Id<PostMarker>),
    #[error("No tag with id {0}")]
    UnknownTag(Id<TagMarker>),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub slug: Slug,
    pub author: Id<UserMarker>,
    pub published_at: OffsetDateTime,
    pub image: Option<String>,
}

#[derive(Clone, Debug)]
struct PostRow {
    id: Id<PostMarker>,
    title: String,
    text: String,
    slug: Slug,
    author: User,
    published_at: OffsetDateTime,
    image: Option<String>,
}

#[derive(Clone, Debug)]
struct TagRow {
    id: Id<TagMarker>,
    title: String,
}

#[derive(Clone, Debug)]
struct CommentRow {
    id: Id<CommentMarker>,
    post: Id<PostMarker>,
    text: String,
    author: User,
    published_at: OffsetDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    next_id: u64,
    users: Vec<User>,
    posts: Vec<PostRow>,
    tags: Vec<TagRow>,
    comments: Vec<CommentRow>,
    post_tags: BTreeSet<(Id<PostMarker>, Id<TagMarker>)>,
    likes: BTreeSet<(Id<PostMarker>, Id<UserMarker>)>,
}

fn limit_to_len(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id<Marker>(&mut self) -> Id<Marker> {
        self.next_id += 1;
        self.next_id.into()
    }

    fn user(&self, id: Id<UserMarker>) -> std::result::Result<&User, MemoryStoreError> {
        self.users
            .iter()
            .find(|user| user.id == id)
            .ok_or(MemoryStoreError::UnknownUser(id))
    }

    pub fn add_user(
        &mut self,
        username: Username,
    ) -> std::result::Result<Id<UserMarker>, MemoryStoreError> {
        if self.users.iter().any(|user| user.username == username) {
            return Err(MemoryStoreError::DuplicateUsername(username.into_inner()));
        }

        let id = self.next_id();
        self.users.push(User { id, username });
        Ok(id)
    }

    pub fn add_tag(
        &mut self,
        title: impl Into<String>,
    ) -> std::result::Result<Id<TagMarker>, MemoryStoreError> {
        let title = title.into();
        if self.tags.iter().any(|tag| tag.title == title) {
            return Err(MemoryStoreError::DuplicateTag(title));
        }

        let id = self.next_id();
        self.tags.push(TagRow { id, title });
        Ok(id)
    }

    pub fn add_post(
        &mut self,
        post: NewPost,
    ) -> std::result::Result<Id<PostMarker>, MemoryStoreError> {
        if self.posts.iter().any(|row| row.slug == post.slug) {
            return Err(MemoryStoreError::DuplicateSlug(post.slug.into_inner()));
        }
        let author = self.user(post.author)?.clone();

        let id = self.next_id();
        self.posts.push(PostRow {
            id,
            title: post.title,
            text: post.text,
            slug: post.slug,
            author,
            published_at: post.published_at,
            image: post.image,
        });
        Ok(id)
    }

    pub fn tag_post(
        &mut self,
        post: Id<PostMarker>,
        tag: Id<TagMarker>,
    ) -> std::result::Result<(), MemoryStoreError> {
        self.post_row(post)?;
        if !self.tags.iter().any(|row| row.id == tag) {
            return Err(MemoryStoreError::UnknownTag(tag));
        }

        self.post_tags.insert((post, tag));
        Ok(())
    }

    pub fn like_post(
        &mut self,
        post: Id<PostMarker>,
        user: Id<UserMarker>,
    ) -> std::result::Result<(), MemoryStoreError> {
        self.post_row(post)?;
        self.user(user)?;

        self.likes.insert((post, user));
        Ok(())
    }

    pub fn add_comment(
        &mut self,
        post: Id<PostMarker>,
        author: Id<UserMarker>,
        text: impl Into<String>,
        published_at: OffsetDateTime,
    ) -> std::result::Result<Id<CommentMarker>, MemoryStoreError> {
        self.post_row(post)?;
        let author = self.user(author)?.clone();

        let id = self.next_id();
        self.comments.push(CommentRow {
            id,
            post,
            text: text.into(),
            author,
            published_at,
        });
        Ok(id)
    }

    fn post_row(&self, id: Id<PostMarker>) -> std::result::Result<&PostRow, MemoryStoreError> {
        self.posts
            .iter()
            .find(|row| row.id == id)
            .ok_or(MemoryStoreError::UnknownPost(id))
    }

    fn load_tag(&self, row: &TagRow) -> Tag {
        let posts_with_tag = self
            .post_tags
            .iter()
            .filter(|(_, tag)| *tag == row.id)
            .count();

        Tag {
            id: row.id,
            title: row.title.clone(),
            posts_with_tag: posts_with_tag as u64,
        }
    }

    fn load_post(&self, row: &PostRow) -> Post {
        let mut tags: Vec<Tag> = self
            .tags
            .iter()
            .filter(|tag| self.post_tags.contains(&(row.id, tag.id)))
            .map(|tag| self.load_tag(tag))
            .collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        let likes_amount = self.likes.iter().filter(|(post, _)| *post == row.id).count();
        let comments_amount = self
            .comments
            .iter()
            .filter(|comment| comment.post == row.id)
            .count();

        Post {
            id: row.id,
            title: row.title.clone(),
            text: row.text.clone(),
            slug: row.slug.clone(),
            author: row.author.clone(),
            published_at: row.published_at,
            image: row.image.clone(),
            tags,
            likes_amount: likes_amount as u64,
            comments_amount: comments_amount as u64,
        }
    }

    fn newest_first(posts: &mut [Post]) {
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(a.id.cmp(&b.id))
        });
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn fetch_popular_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.iter().map(|row| self.load_post(row)).collect();
        posts.sort_by_key(|post| (Reverse(post.likes_amount), post.id));
        posts.truncate(limit_to_len(limit));

        Ok(posts)
    }

    async fn fetch_fresh_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.iter().map(|row| self.load_post(row)).collect();
        Self::newest_first(&mut posts);
        posts.truncate(limit_to_len(limit));

        Ok(posts)
    }

    async fn fetch_post_by_slug(&self, slug: &Slug) -> Result<Option<Post>> {
        let post = self
            .posts
            .iter()
            .find(|row| row.slug == *slug)
            .map(|row| self.load_post(row));

        Ok(post)
    }

    async fn fetch_comments_for_post(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let mut rows: Vec<&CommentRow> = self
            .comments
            .iter()
            .filter(|comment| comment.post == post_id)
            .collect();
        rows.sort_by_key(|comment| (comment.published_at, comment.id));

        let comments = rows
            .into_iter()
            .map(|row| Comment {
                id: row.id,
                text: row.text.clone(),
                author: row.author.clone(),
                published_at: row.published_at,
            })
            .collect();

        Ok(comments)
    }

    async fn fetch_popular_tags(&self, limit: u32) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self.tags.iter().map(|row| self.load_tag(row)).collect();
        tags.sort_by_key(|tag| (Reverse(tag.posts_with_tag), tag.id));
        tags.truncate(limit_to_len(limit));

        Ok(tags)
    }

    async fn fetch_tag_by_title(&self, title: &str) -> Result<Option<Tag>> {
        let tag = self
            .tags
            .iter()
            .find(|row| row.title == title)
            .map(|row| self.load_tag(row));

        Ok(tag)
    }

    async fn fetch_posts_for_tag(&self, tag_id: Id<TagMarker>, limit: u32) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|row| self.post_tags.contains(&(row.id, tag_id)))
            .map(|row| self.load_post(row))
            .collect();
        Self::newest_first(&mut posts);
        posts.truncate(limit_to_len(limit));

        Ok(posts)
    }
}
