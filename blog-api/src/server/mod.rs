use axum::{
    extract::{FromRef, Request, rejection::PathRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use blog_common::view::MediaUrl;
use blog_db::{BlogStore, DbError};
use render::{Html, Templates};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

pub mod render;
mod routes;

pub type ServerRouter = axum::Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub store: Arc<dyn BlogStore>,
    pub templates: Arc<Templates>,
    pub media_url: Arc<MediaUrl>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Template could not be rendered: {0}")]
    Render(#[from] tera::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => StatusCode::NOT_FOUND,
            ServerError::Database(_) | ServerError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let reason = status.canonical_reason().unwrap_or("Error");
        let body = format!(
            "<html><body><h1>{code} {reason}</h1><p><a href=\"/\">Back to home</a></p></body></html>",
            code = status.as_u16(),
        );
        (status, Html(body)).into_response()
    }
}
