use blog_common::model::{
    ModelValidationError,
    comment::Comment,
    count_from_db,
    post::{Post, Slug},
    tag::Tag,
    user::{User, Username},
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub image: String,
    pub published_at: OffsetDateTime,
    pub author_id: i64,
    pub username: String,
    pub likes_amount: i64,
    pub comments_amount: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct TagRecord {
    pub tag_id: i64,
    pub title: String,
    pub posts_with_tag: i64,
}

/// A tag row together with the post it was loaded for.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostTagRecord {
    pub post_id: i64,
    #[sqlx(flatten)]
    pub tag: TagRecord,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub text: String,
    pub published_at: OffsetDateTime,
    pub author_id: i64,
    pub username: String,
}

fn user(user_id: i64, username: String) -> Result<User, ModelValidationError> {
    Ok(User {
        id: user_id.cast_unsigned().into(),
        username: Username::new(username)?,
    })
}

impl PostRecord {
    pub fn into_post(self, tags: Vec<Tag>) -> Result<Post, ModelValidationError> {
        Ok(Post {
            id: self.post_id.cast_unsigned().into(),
            title: self.title,
            text: self.text,
            slug: Slug::new(self.slug)?,
            author: user(self.author_id, self.username)?,
            published_at: self.published_at,
            image: Some(self.image).filter(|image| !image.is_empty()),
            tags,
            likes_amount: count_from_db(self.likes_amount)?,
            comments_amount: count_from_db(self.comments_amount)?,
        })
    }
}

impl TryFrom<TagRecord> for Tag {
    type Error = ModelValidationError;

    fn try_from(value: TagRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.tag_id.cast_unsigned().into(),
            title: value.title,
            posts_with_tag: count_from_db(value.posts_with_tag)?,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.cast_unsigned().into(),
            text: value.text,
            author: user(value.author_id, value.username)?,
            published_at: value.published_at,
        })
    }
}
