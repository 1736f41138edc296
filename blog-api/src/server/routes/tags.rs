use crate::server::{
    Result, ServerError, ServerRouter,
    render::{Html, Templates},
    routes::{TAG_POSTS_LIMIT, popular_posts, popular_tags, summarize},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use blog_common::view::{MediaUrl, PostSummary, TagSummary};
use blog_db::BlogStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const TAG_NOT_FOUND_PAGE: &str = "<html>\
    <body>\
    This tag does not exist\
    <p><a href=\"/\">Back to home</a></p>\
    </body>\
    </html>";

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(tag_page)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/tags/{tag_title}", rejection(ServerError))]
struct TagPath {
    tag_title: String,
}

#[derive(Serialize)]
struct TagContext {
    tag: String,
    popular_tags: Vec<TagSummary>,
    posts: Vec<PostSummary>,
    most_popular_posts: Vec<PostSummary>,
}

async fn tag_page(
    TagPath { tag_title }: TagPath,
    State(store): State<Arc<dyn BlogStore>>,
    State(templates): State<Arc<Templates>>,
    State(media): State<Arc<MediaUrl>>,
) -> Result<Html> {
    let Some(tag) = store.fetch_tag_by_title(&tag_title).await? else {
        debug!(%tag_title, "Tag not found, serving fallback page");
        return Ok(TAG_NOT_FOUND_PAGE.into());
    };

    let popular_tags = popular_tags(&*store).await?;
    let most_popular_posts = popular_posts(&*store, &media).await?;
    let posts = store.fetch_posts_for_tag(tag.id, TAG_POSTS_LIMIT).await?;

    let context = TagContext {
        tag: tag.title,
        popular_tags,
        posts: summarize(&posts, &media),
        most_popular_posts,
    };
    templates.render("posts-list.html", &context)
}
