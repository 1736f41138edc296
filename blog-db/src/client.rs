use crate::{
    record::{CommentRecord, PostRecord, PostTagRecord, TagRecord},
    store::{BlogStore, Result},
};
use async_trait::async_trait;
use blog_common::model::{
    Id,
    comment::Comment,
    post::{Post, PostMarker, Slug},
    tag::{Tag, TagMarker},
};
use sqlx::{PgPool, migrate::Migrator, query_as};
use std::collections::HashMap;
use tracing::trace;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Builds a post query: author joined, counts computed, followed by the given clauses.
macro_rules! post_query {
    ($($tail:literal),* $(,)?) => {
        concat!(
            "
            SELECT
                posts.post_id,
                posts.title,
                posts.text,
                posts.slug,
                posts.image,
                posts.published_at,
                users.user_id AS author_id,
                users.username,
                (
                    SELECT COUNT(*) FROM blog.post_likes
                    WHERE post_likes.post_id = posts.post_id
                ) AS likes_amount,
                (
                    SELECT COUNT(*) FROM blog.comments
                    WHERE comments.post_id = posts.post_id
                ) AS comments_amount
            FROM
                blog.posts JOIN users.users ON users.user_id = posts.author_id
            ",
            $($tail),*
        )
    };
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Loads the tags of all given posts in one round trip and attaches them.
    async fn attach_tags(&self, records: Vec<PostRecord>) -> Result<Vec<Post>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = records.iter().map(|record| record.post_id).collect();

        let tag_records = query_as::<_, PostTagRecord>(
            "
            SELECT
                post_tags.post_id,
                tags.tag_id,
                tags.title,
                (
                    SELECT COUNT(*) FROM blog.post_tags AS counted
                    WHERE counted.tag_id = tags.tag_id
                ) AS posts_with_tag
            FROM
                blog.post_tags JOIN blog.tags ON tags.tag_id = post_tags.tag_id
            WHERE
                post_tags.post_id = ANY($1)
            ORDER BY
                post_tags.post_id, tags.title, tags.tag_id
            ",
        )
        .bind(post_ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        trace!(
            posts = post_ids.len(),
            tags = tag_records.len(),
            "Attaching prefetched tags"
        );

        let mut tags_by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
        for record in tag_records {
            tags_by_post
                .entry(record.post_id)
                .or_default()
                .push(Tag::try_from(record.tag)?);
        }

        let posts = records
            .into_iter()
            .map(|record| {
                let tags = tags_by_post.remove(&record.post_id).unwrap_or_default();
                record.into_post(tags)
            })
            .collect::<Result<_, _>>()?;

        Ok(posts)
    }
}

#[async_trait]
impl BlogStore for DbClient {
    async fn fetch_popular_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(post_query!(
            "
            ORDER BY
                likes_amount DESC, posts.post_id ASC
            LIMIT $1
            "
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        self.attach_tags(records).await
    }

    async fn fetch_fresh_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(post_query!(
            "
            ORDER BY
                posts.published_at DESC, posts.post_id ASC
            LIMIT $1
            "
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        self.attach_tags(records).await
    }

    async fn fetch_post_by_slug(&self, slug: &Slug) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(post_query!(
            "
            WHERE
                posts.slug = $1
            "
        ))
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        Ok(self.attach_tags(vec![record]).await?.pop())
    }

    async fn fetch_comments_for_post(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.text,
                comments.published_at,
                users.user_id AS author_id,
                users.username
            FROM
                blog.comments JOIN users.users ON users.user_id = comments.author_id
            WHERE
                comments.post_id = $1
            ORDER BY
                comments.published_at ASC, comments.comment_id ASC
            ",
        )
        .bind(post_id.get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    async fn fetch_popular_tags(&self, limit: u32) -> Result<Vec<Tag>> {
        let records = query_as::<_, TagRecord>(
            "
            SELECT
                tags.tag_id,
                tags.title,
                COUNT(post_tags.post_id) AS posts_with_tag
            FROM
                blog.tags LEFT JOIN blog.post_tags ON post_tags.tag_id = tags.tag_id
            GROUP BY
                tags.tag_id
            ORDER BY
                posts_with_tag DESC, tags.tag_id ASC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let tags = records
            .into_iter()
            .map(Tag::try_from)
            .collect::<Result<_, _>>()?;
        Ok(tags)
    }

    async fn fetch_tag_by_title(&self, title: &str) -> Result<Option<Tag>> {
        let record = query_as::<_, TagRecord>(
            "
            SELECT
                tags.tag_id,
                tags.title,
                (
                    SELECT COUNT(*) FROM blog.post_tags
                    WHERE post_tags.tag_id = tags.tag_id
                ) AS posts_with_tag
            FROM
                blog.tags
            WHERE
                tags.title = $1
            ",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        let tag = record.map(Tag::try_from).transpose()?;
        Ok(tag)
    }

    async fn fetch_posts_for_tag(&self, tag_id: Id<TagMarker>, limit: u32) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(post_query!(
            "
            WHERE
                EXISTS (
                    SELECT 1 FROM blog.post_tags
                    WHERE post_tags.post_id = posts.post_id AND post_tags.tag_id = $1
                )
            ORDER BY
                posts.published_at DESC, posts.post_id ASC
            LIMIT $2
            "
        ))
        .bind(tag_id.get().cast_signed())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        self.attach_tags(records).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{BlogStore, client::DbClient};
    use blog_common::model::{
        Id,
        post::{Post, Slug},
    };
    use sqlx::{PgPool, error::ErrorKind, query, query_scalar};
    use time::{Duration, OffsetDateTime, macros::datetime};

    const START: OffsetDateTime = datetime!(2024-05-01 9:00 UTC);

    async fn add_user(pool: &PgPool, username: &str) -> sqlx::Result<i64> {
        query_scalar("INSERT INTO users.users (username) VALUES ($1) RETURNING user_id")
            .bind(username)
            .fetch_one(pool)
            .await
    }

    /// Adds a post published `day` days after the start date.
    async fn add_post(pool: &PgPool, author: i64, slug: &str, day: i64) -> sqlx::Result<i64> {
        query_scalar(
            "
            INSERT INTO blog.posts (title, text, slug, published_at, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING post_id
            ",
        )
        .bind(format!("Title of {slug}"))
        .bind(format!("Body of {slug}"))
        .bind(slug)
        .bind(START + Duration::days(day))
        .bind(author)
        .fetch_one(pool)
        .await
    }

    async fn add_tag(pool: &PgPool, title: &str) -> i64 {
        query_scalar("INSERT INTO blog.tags (title) VALUES ($1) RETURNING tag_id")
            .bind(title)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn tag_post(pool: &PgPool, post: i64, tag: i64) {
        query("INSERT INTO blog.post_tags (post_id, tag_id) VALUES ($1, $2)")
            .bind(post)
            .bind(tag)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn like_post(pool: &PgPool, post: i64, users: &[i64]) {
        for user in users {
            query("INSERT INTO blog.post_likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post)
                .bind(*user)
                .execute(pool)
                .await
                .unwrap();
        }
    }

    async fn add_comment(pool: &PgPool, post: i64, author: i64, text: &str, minute: i64) {
        query(
            "
            INSERT INTO blog.comments (post_id, author_id, text, published_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(post)
        .bind(author)
        .bind(text)
        .bind(START + Duration::minutes(minute))
        .execute(pool)
        .await
        .unwrap();
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.slug.get()).collect()
    }

    fn slug(slug: &str) -> Slug {
        Slug::new(slug.to_owned()).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn popular_and_fresh_posts(pool: PgPool) {
        let author = add_user(&pool, "editor").await.unwrap();
        let reader = add_user(&pool, "reader").await.unwrap();

        let first = add_post(&pool, author, "first", 0).await.unwrap();
        let second = add_post(&pool, author, "second", 1).await.unwrap();
        let third = add_post(&pool, author, "third", 2).await.unwrap();
        add_post(&pool, author, "same-day", 2).await.unwrap();

        like_post(&pool, first, &[reader]).await;
        like_post(&pool, second, &[author, reader]).await;
        like_post(&pool, third, &[author, reader]).await;
        add_comment(&pool, first, reader, "one", 0).await;
        add_comment(&pool, first, author, "two", 1).await;

        let db = DbClient::new(pool);

        let popular = db.fetch_popular_posts(3).await.unwrap();
        assert_eq!(slugs(&popular), ["second", "third", "first"]);
        assert_eq!(popular[0].likes_amount, 2);
        assert_eq!(popular[2].comments_amount, 2);
        assert_eq!(popular[2].author.username.get(), "editor");

        let fresh = db.fetch_fresh_posts(5).await.unwrap();
        assert_eq!(slugs(&fresh), ["third", "same-day", "second", "first"]);
        assert_eq!(fresh[1].likes_amount, 0);
        assert!(fresh[1].tags.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn tags_are_counted_and_ordered(pool: PgPool) {
        let author = add_user(&pool, "editor").await.unwrap();
        let zig = add_tag(&pool, "zig").await;
        let ada = add_tag(&pool, "ada").await;
        add_tag(&pool, "unused").await;

        let both = add_post(&pool, author, "both", 0).await.unwrap();
        let only_zig = add_post(&pool, author, "only-zig", 1).await.unwrap();
        tag_post(&pool, both, zig).await;
        tag_post(&pool, both, ada).await;
        tag_post(&pool, only_zig, zig).await;

        let db = DbClient::new(pool);

        let post = db.fetch_post_by_slug(&slug("both")).await.unwrap().unwrap();
        let tags: Vec<_> = post
            .tags
            .iter()
            .map(|tag| (tag.title.as_str(), tag.posts_with_tag))
            .collect();
        assert_eq!(tags, [("ada", 1), ("zig", 2)]);
        assert!(db.fetch_post_by_slug(&slug("missing")).await.unwrap().is_none());

        let popular: Vec<_> = db
            .fetch_popular_tags(5)
            .await
            .unwrap()
            .into_iter()
            .map(|tag| (tag.title, tag.posts_with_tag))
            .collect();
        assert_eq!(
            popular,
            [
                ("zig".to_owned(), 2),
                ("ada".to_owned(), 1),
                ("unused".to_owned(), 0)
            ]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn posts_for_tag(pool: PgPool) {
        let author = add_user(&pool, "editor").await.unwrap();
        let rust = add_tag(&pool, "rust").await;

        for day in 0..4 {
            let post = add_post(&pool, author, &format!("post-{day}"), day)
                .await
                .unwrap();
            if day != 2 {
                tag_post(&pool, post, rust).await;
            }
        }

        let db = DbClient::new(pool);

        assert!(db.fetch_tag_by_title("Rust").await.unwrap().is_none());
        let tag = db.fetch_tag_by_title("rust").await.unwrap().unwrap();
        assert_eq!(tag.id, Id::new(rust.cast_unsigned()));
        assert_eq!(tag.posts_with_tag, 3);

        let posts = db.fetch_posts_for_tag(tag.id, 2).await.unwrap();
        assert_eq!(slugs(&posts), ["post-3", "post-1"]);
        assert_eq!(posts[0].tags[0].title, "rust");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn comments_in_publication_order(pool: PgPool) {
        let author = add_user(&pool, "editor").await.unwrap();
        let reader = add_user(&pool, "reader").await.unwrap();
        let post = add_post(&pool, author, "discussed", 0).await.unwrap();
        let other = add_post(&pool, author, "quiet", 1).await.unwrap();

        add_comment(&pool, post, reader, "late", 10).await;
        add_comment(&pool, post, author, "early", 1).await;
        add_comment(&pool, post, reader, "tied", 10).await;
        add_comment(&pool, other, reader, "elsewhere", 0).await;

        let db = DbClient::new(pool);

        let comments = db
            .fetch_comments_for_post(Id::new(post.cast_unsigned()))
            .await
            .unwrap();
        let texts: Vec<_> = comments.iter().map(|comment| comment.text.as_str()).collect();
        assert_eq!(texts, ["early", "late", "tied"]);
        assert_eq!(comments[0].author.username.get(), "editor");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn schema_rejects_invalid_keys(pool: PgPool) {
        let is_check_violation = |err: sqlx::Error| {
            err.as_database_error()
                .is_some_and(|err| matches!(err.kind(), ErrorKind::CheckViolation))
        };

        assert!(is_check_violation(add_user(&pool, "").await.unwrap_err()));

        let author = add_user(&pool, "editor").await.unwrap();
        for invalid in ["", "with space", "slash/inside", "привет"] {
            let err = add_post(&pool, author, invalid, 0).await.unwrap_err();
            assert!(is_check_violation(err), "{invalid:?} should be rejected");
        }

        add_post(&pool, author, "A-b_C-9", 0).await.unwrap();
        let db = DbClient::new(pool);
        assert!(db.fetch_post_by_slug(&slug("A-b_C-9")).await.unwrap().is_some());
    }
}
