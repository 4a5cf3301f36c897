use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::pages::NotFoundPage;

#[derive(Debug, Error)]
pub enum SiteError {
    /// Carries the site name for the rendered 404 page.
    #[error("not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("render error: {0}")]
    Render(#[from] askama::Error),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        match self {
            SiteError::NotFound(site_name) => not_found_response(&site_name),
            other => {
                error!("request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>Something went wrong</h1>".to_string()),
                )
                    .into_response()
            }
        }
    }
}

pub fn not_found_response(site_name: &str) -> Response {
    match NotFoundPage::for_site(site_name).render() {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(err) => {
            error!("not-found page failed to render: {err}");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}
