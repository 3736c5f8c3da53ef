use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::session::{AuthError, AuthProvider, AuthSession, AuthUser, SignUpOutcome};

/// Token response of the hosted auth service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(t: TokenResponse) -> Self {
        AuthSession {
            user: t.user,
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at: Utc::now() + Duration::seconds(t.expires_in),
        }
    }
}

/// The auth service has used several error shapes over time; read whichever is present.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

/// `AuthProvider` backed by the hosted auth service (GoTrue REST API).
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            anon_key,
        }
    }

    async fn post(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Result<Response, AuthError> {
        let url = format!("{}/auth/v1{}", self.base_url, path);
        let mut request = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to send POST request to {}: {}", url, e);
            AuthError::Http(e)
        })?;
        check(response).await
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .post(
                "/token?grant_type=password",
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.into())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .post(
                "/signup",
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        let body: serde_json::Value = response.json().await?;

        // With email confirmation enabled the service answers with a bare user object.
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)?;
            Ok(SignUpOutcome::SignedIn(token.into()))
        } else {
            debug!("Sign-up for {} awaits email confirmation", email);
            Ok(SignUpOutcome::ConfirmationRequired)
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .post(
                "/token?grant_type=refresh_token",
                None,
                json!({ "refresh_token": refresh_token }),
            )
            .await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.post("/logout", Some(access_token), json!({})).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: AuthErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let bad_credentials = body.error.as_deref() == Some("invalid_grant")
        || body.error_code.as_deref() == Some("invalid_credentials");
    if status.as_u16() == 400 && bad_credentials {
        return Err(AuthError::InvalidCredentials);
    }

    warn!("Auth API returned {}: {}", status, text);
    let message = body
        .error_description
        .or(body.msg)
        .or(body.message)
        .unwrap_or(text);
    Err(AuthError::Api {
        status: status.as_u16(),
        message,
    })
}
