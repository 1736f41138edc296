use crate::server::{Result, ServerRouter};
use blog_common::{
    model::post::Post,
    view::{MediaUrl, PostSummary, TagSummary},
};
use blog_db::BlogStore;

mod contacts;
mod index;
mod posts;
mod tags;

const POPULAR_POSTS_LIMIT: u32 = 5;
const FRESH_POSTS_LIMIT: u32 = 5;
const POPULAR_TAGS_LIMIT: u32 = 5;
const TAG_POSTS_LIMIT: u32 = 20;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(index::routes())
        .merge(posts::routes())
        .merge(tags::routes())
        .merge(contacts::routes())
}

fn summarize(posts: &[Post], media: &MediaUrl) -> Vec<PostSummary> {
    posts
        .iter()
        .map(|post| PostSummary::new(post, media))
        .collect()
}

async fn popular_posts(store: &dyn BlogStore, media: &MediaUrl) -> Result<Vec<PostSummary>> {
    let posts = store.fetch_popular_posts(POPULAR_POSTS_LIMIT).await?;
    Ok(summarize(&posts, media))
}

async fn popular_tags(store: &dyn BlogStore) -> Result<Vec<TagSummary>> {
    let tags = store.fetch_popular_tags(POPULAR_TAGS_LIMIT).await?;
    Ok(tags.iter().map(TagSummary::from).collect())
}
