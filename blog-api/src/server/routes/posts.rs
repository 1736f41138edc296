use crate::server::{
    Result, ServerError, ServerRouter,
    render::{Html, Templates},
    routes::{popular_posts, popular_tags},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use blog_common::{
    model::post::Slug,
    view::{MediaUrl, PostDetail, PostSummary, TagSummary},
};
use blog_db::BlogStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const POST_NOT_FOUND_PAGE: &str = "<html>\
    <body>\
    This post does not exist\
    <p><a href=\"/\">Back to home</a></p>\
    </body>\
    </html>";

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(post_detail_page)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{slug}", rejection(ServerError))]
struct PostDetailPath {
    slug: String,
}

#[derive(Serialize)]
struct PostDetailContext {
    post: PostDetail,
    popular_tags: Vec<TagSummary>,
    most_popular_posts: Vec<PostSummary>,
}

async fn post_detail_page(
    PostDetailPath { slug }: PostDetailPath,
    State(store): State<Arc<dyn BlogStore>>,
    State(templates): State<Arc<Templates>>,
    State(media): State<Arc<MediaUrl>>,
) -> Result<Html> {
    let post = match Slug::new(slug) {
        Ok(slug) => store.fetch_post_by_slug(&slug).await?,
        Err(err) => {
            debug!(%err, "Requested slug cannot exist");
            None
        }
    };
    let Some(post) = post else {
        debug!("Post not found, serving fallback page");
        return Ok(POST_NOT_FOUND_PAGE.into());
    };

    let comments = store.fetch_comments_for_post(post.id).await?;

    let context = PostDetailContext {
        post: PostDetail::new(&post, &comments, &media),
        popular_tags: popular_tags(&*store).await?,
        most_popular_posts: popular_posts(&*store, &media).await?,
    };
    templates.render("post-details.html", &context)
}
