//! Sign-in, sign-up and sign-out views.

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use crate::errors::AppError;
use crate::notifications::{self, Notification};
use crate::session::{AuthEvent, CurrentUser, SessionProvider, SignUpOutcome};
use crate::state::AppState;
use crate::views::{render, Chrome};

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub chrome: Chrome,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required.".to_string(),
            ));
        }
        Ok(())
    }
}

async fn auth_page(
    session: &Session,
    status: StatusCode,
    email: String,
    error: Option<String>,
) -> Result<Response, AppError> {
    let page = AuthTemplate {
        chrome: Chrome::load(session, None).await,
        email,
        error,
    };
    Ok((status, render(&page)?).into_response())
}

/// GET /auth
pub async fn handle_auth_page(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    auth_page(&session, StatusCode::OK, String::new(), None).await
}

/// POST /auth/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    if let Err(e) = credentials.validate() {
        return auth_page(
            &session,
            StatusCode::UNPROCESSABLE_ENTITY,
            credentials.email,
            Some(e.user_message()),
        )
        .await;
    }

    match state
        .auth
        .sign_in(credentials.email.trim(), &credentials.password)
        .await
    {
        Ok(auth) => {
            SessionProvider::apply(&session, AuthEvent::SignedIn(auth)).await?;
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(e) => {
            warn!("Sign-in failed: {e}");
            auth_page(
                &session,
                e.status(),
                credentials.email,
                Some(e.user_message().to_string()),
            )
            .await
        }
    }
}

/// POST /auth/sign-up
pub async fn handle_sign_up(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    if let Err(e) = credentials.validate() {
        return auth_page(
            &session,
            StatusCode::UNPROCESSABLE_ENTITY,
            credentials.email,
            Some(e.user_message()),
        )
        .await;
    }

    match state
        .auth
        .sign_up(credentials.email.trim(), &credentials.password)
        .await
    {
        Ok(SignUpOutcome::SignedIn(auth)) => {
            SessionProvider::apply(&session, AuthEvent::SignedIn(auth)).await?;
            Ok(Redirect::to("/dashboard").into_response())
        }
        Ok(SignUpOutcome::ConfirmationRequired) => {
            notifications::push(
                &session,
                Notification::info("Check your email to confirm your account, then sign in."),
            )
            .await;
            Ok(Redirect::to("/auth").into_response())
        }
        Err(e) => {
            warn!("Sign-up failed: {e}");
            auth_page(
                &session,
                e.status(),
                credentials.email,
                Some(e.user_message().to_string()),
            )
            .await
        }
    }
}

/// POST /auth/sign-out
///
/// Revokes the token at the provider, then clears the session whatever the
/// provider said.
pub async fn handle_sign_out(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    if let Some(user) = SessionProvider::current(&session).await? {
        if let Err(e) = state.auth.sign_out(&user.access_token).await {
            warn!(user_id = %user.id, "Token revocation failed: {e}");
        }
    }
    SessionProvider::apply(&session, AuthEvent::SignedOut).await?;
    Ok(Redirect::to("/"))
}
