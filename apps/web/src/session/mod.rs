//! Session Provider: who is signed in, and the one place that changes it.
//!
//! The identity lives in the server-side session. Handlers never read the session
//! keys directly: they take `CurrentUser`, `RequireUser` or `ApiUser` as explicit
//! context, and every sign-in, refresh and sign-out goes through
//! `SessionProvider::apply`.

pub mod handlers;
pub mod supabase;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::Owner;

pub use supabase::SupabaseAuth;

const SESSION_USER_KEY: &str = "session_user";
/// Tokens this close to expiry are refreshed before use.
const REFRESH_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Auth API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::Api { status, .. } if (400..500).contains(status) => {
                "The sign-in service rejected the request. Check your details and try again."
            }
            _ => "The sign-in service is unavailable. Please try again.",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Api { status, .. } if (400..500).contains(status) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Identity as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A live session from the auth provider.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a sign-up: either signed in straight away, or waiting on email confirmation.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired,
}

/// The hosted identity service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Identity as kept in the session and handed to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionUser {
    pub fn owner(&self) -> Owner<'_> {
        Owner {
            user_id: self.id,
            access_token: &self.access_token,
        }
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_LEEWAY_SECS) <= now
    }
}

impl From<AuthSession> for SessionUser {
    fn from(s: AuthSession) -> Self {
        SessionUser {
            id: s.user.id,
            email: s.user.email.unwrap_or_default(),
            access_token: s.access_token,
            refresh_token: s.refresh_token,
            expires_at: s.expires_at,
        }
    }
}

/// Auth-state changes. The only inputs that mutate the session identity.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
}

pub struct SessionProvider;

impl SessionProvider {
    /// Reads the current identity without refreshing it.
    pub async fn current(session: &Session) -> Result<Option<SessionUser>, AppError> {
        Ok(session.get::<SessionUser>(SESSION_USER_KEY).await?)
    }

    /// Applies an auth-state change and returns the resulting identity.
    pub async fn apply(
        session: &Session,
        event: AuthEvent,
    ) -> Result<Option<SessionUser>, AppError> {
        match event {
            AuthEvent::SignedIn(auth) => {
                let user = SessionUser::from(auth);
                // New identity, new session id.
                session.cycle_id().await?;
                session.insert(SESSION_USER_KEY, &user).await?;
                info!(user_id = %user.id, "User signed in");
                Ok(Some(user))
            }
            AuthEvent::TokenRefreshed(auth) => {
                let user = SessionUser::from(auth);
                session.insert(SESSION_USER_KEY, &user).await?;
                info!(user_id = %user.id, "Session token refreshed");
                Ok(Some(user))
            }
            AuthEvent::SignedOut => {
                session.remove_value(SESSION_USER_KEY).await?;
                crate::dashboard::state::forget(session).await?;
                info!("User signed out");
                Ok(None)
            }
        }
    }

    /// Current identity, refreshing the access token if it is about to expire.
    /// A failed refresh signs the user out.
    pub async fn resolve(
        session: &Session,
        auth: &dyn AuthProvider,
    ) -> Result<Option<SessionUser>, AppError> {
        let Some(user) = Self::current(session).await? else {
            return Ok(None);
        };

        if !user.needs_refresh(Utc::now()) {
            return Ok(Some(user));
        }

        match auth.refresh(&user.refresh_token).await {
            Ok(refreshed) => Self::apply(session, AuthEvent::TokenRefreshed(refreshed)).await,
            Err(e) => {
                warn!(user_id = %user.id, "Token refresh failed: {e}");
                Self::apply(session, AuthEvent::SignedOut).await
            }
        }
    }
}

async fn session_from_parts(parts: &mut Parts, state: &AppState) -> Result<Session, AppError> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!("session layer missing: {msg}")))
}

/// Optional identity, for views that only adapt to it (navigation, landing).
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let session = session_from_parts(parts, state).await?;
        Ok(CurrentUser(
            SessionProvider::resolve(&session, state.auth.as_ref()).await?,
        ))
    }
}

/// Identity for protected HTML views. Unauthenticated requests are redirected to `/auth`.
#[derive(Debug, Clone)]
pub struct RequireUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Response> {
        let session = session_from_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match SessionProvider::resolve(&session, state.auth.as_ref()).await {
            Ok(Some(user)) => Ok(RequireUser(user)),
            Ok(None) => Err(Redirect::to("/auth").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Identity for the JSON API. Unauthenticated requests get a 401 body.
#[derive(Debug, Clone)]
pub struct ApiUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let session = session_from_parts(parts, state).await?;
        SessionProvider::resolve(&session, state.auth.as_ref())
            .await?
            .map(ApiUser)
            .ok_or(AppError::Unauthorized)
    }
}
