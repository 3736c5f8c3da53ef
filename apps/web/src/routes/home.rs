use askama::Template;
use axum::response::Html;
use tower_sessions::Session;

use crate::errors::AppError;
use crate::session::CurrentUser;
use crate::views::{render, Chrome};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
}

/// GET /
pub async fn home_handler(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Html<String>, AppError> {
    render(&HomeTemplate {
        chrome: Chrome::load(&session, user.as_ref()).await,
    })
}
