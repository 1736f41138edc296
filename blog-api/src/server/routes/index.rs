use crate::server::{
    Result, ServerRouter,
    render::{Html, Templates},
    routes::{FRESH_POSTS_LIMIT, popular_posts, popular_tags, summarize},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use blog_common::view::{MediaUrl, PostSummary, TagSummary};
use blog_db::BlogStore;
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(home_page)
}

#[derive(TypedPath)]
#[typed_path("/")]
struct HomePath;

#[derive(Serialize)]
struct HomeContext {
    most_popular_posts: Vec<PostSummary>,
    page_posts: Vec<PostSummary>,
    popular_tags: Vec<TagSummary>,
}

async fn home_page(
    _: HomePath,
    State(store): State<Arc<dyn BlogStore>>,
    State(templates): State<Arc<Templates>>,
    State(media): State<Arc<MediaUrl>>,
) -> Result<Html> {
    let most_popular_posts = popular_posts(&*store, &media).await?;
    let fresh_posts = store.fetch_fresh_posts(FRESH_POSTS_LIMIT).await?;
    let popular_tags = popular_tags(&*store).await?;

    let context = HomeContext {
        most_popular_posts,
        page_posts: summarize(&fresh_posts, &media),
        popular_tags,
    };
    templates.render("index.html", &context)
}

#[cfg(test)]
mod tests {
    use crate::server::routes::testing::{Blog, position};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn home_lists_popular_and_fresh_posts() {
        let mut blog = Blog::new();
        let rust = blog.tag("rust");
        let web = blog.tag("web");

        blog.post("oldest-but-loved", 5, &[rust]);
        for i in 0..5 {
            blog.post(&format!("fresh-{i}"), 0, &[rust, web]);
        }
        blog.post("newest", 1, &[]);

        let (status, body) = blog.get("/").await;
        assert_eq!(status, StatusCode::OK);

        let popular = position(&body, "Most popular");
        let fresh = position(&body, "Fresh posts");
        assert!(position(&body, "/posts/oldest-but-loved") < fresh);
        assert!(popular < position(&body, "/posts/newest"));

        let fresh_section = &body[fresh..];
        assert!(position(fresh_section, "/posts/newest") < position(fresh_section, "/posts/fresh-4"));
        assert!(!fresh_section[..position(fresh_section, "Popular tags")].contains("fresh-0"));

        assert!(body.contains("#rust (6)"));
        assert!(body.contains("#web (5)"));
    }

    #[tokio::test]
    async fn home_without_posts() {
        let (status, body) = Blog::new().get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No posts yet."));
    }
}
