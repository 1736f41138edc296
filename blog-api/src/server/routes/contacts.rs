use crate::server::{
    Result, ServerRouter,
    render::{Html, Templates},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(contacts_page)
}

#[derive(TypedPath)]
#[typed_path("/contacts")]
struct ContactsPath;

#[derive(Serialize)]
struct ContactsContext {}

async fn contacts_page(
    _: ContactsPath,
    State(templates): State<Arc<Templates>>,
) -> Result<Html> {
    templates.render("contacts.html", &ContactsContext {})
}
