//! Public pages.

use axum::extract::Query;
use axum::response::Html;
use serde::Deserialize;

use crate::session::Session;
use crate::views;

pub async fn index(session: Session) -> Html<String> {
    let identity = session.identity();
    Html(views::index_page(identity.as_ref().map(|i| &i.user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    error: Option<String>,
}

pub async fn login(Query(params): Query<LoginParams>) -> Html<String> {
    Html(views::login_page(params.error.is_some()))
}

pub async fn error() -> Html<String> {
    Html(views::error_page("An error occurred in contacts section"))
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}
