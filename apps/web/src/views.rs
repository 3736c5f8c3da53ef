//! Shared page chrome for the askama views.

use askama::Template;
use axum::response::Html;
use tower_sessions::Session;

use crate::errors::AppError;
use crate::notifications::{self, Notification};
use crate::session::SessionUser;

/// What `base.html` needs on every page: who is signed in and the pending toasts.
/// Building it drains the notification queue.
pub struct Chrome {
    pub email: Option<String>,
    pub notifications: Vec<Notification>,
}

impl Chrome {
    pub async fn load(session: &Session, user: Option<&SessionUser>) -> Self {
        Chrome {
            email: user.map(|u| u.email.clone()),
            notifications: notifications::drain(session).await,
        }
    }

    /// Chrome for an interstitial page. Pending toasts stay queued for the page that follows.
    pub fn keep_notifications(user: Option<&SessionUser>) -> Self {
        Chrome {
            email: user.map(|u| u.email.clone()),
            notifications: Vec::new(),
        }
    }

    pub fn signed_in(&self) -> bool {
        self.email.is_some()
    }

    pub fn email_label(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
