//! Test doubles shared by the unit and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::llm_client::{GenerationError, PromptPair, TextGenerator};
use crate::models::{ContentMetadata, Document, DocumentContent, DocumentType, JobDetails};
use crate::session::{AuthError, AuthProvider, AuthSession, AuthUser, SignUpOutcome};
use crate::state::AppState;
use crate::store::memory::MemoryStore;

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

/// A live session for `id`, valid for an hour.
pub fn auth_session(id: Uuid, email: &str) -> AuthSession {
    AuthSession {
        user: AuthUser {
            id,
            email: Some(email.to_string()),
        },
        access_token: "access-token".to_string(),
        refresh_token: "refresh-token".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// A stored resume with a two-paragraph body.
pub fn document(title: &str) -> Document {
    let now = Utc::now();
    Document {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        doc_type: DocumentType::Resume,
        title: title.to_string(),
        content: DocumentContent {
            text: "JANE DOE\n\nSenior engineer with ten years of platform work.".to_string(),
            metadata: ContentMetadata {
                job_title: "Engineer".to_string(),
                company: "Acme".to_string(),
                generated_at: now,
            },
        },
        job_details: JobDetails {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build things".to_string(),
        },
        created_at: now,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

/// Answers every prompt with the same scripted result and counts the calls.
pub struct ScriptedGenerator {
    result: Result<String, GenerationError>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn ok(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(error: GenerationError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &PromptPair) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

/// In-process identity service. Every account shares `PASSWORD`.
pub struct FakeAuth {
    pub user_id: Uuid,
    fail_refresh: bool,
    confirm_sign_up: bool,
    sign_outs: AtomicUsize,
}

impl FakeAuth {
    pub const PASSWORD: &'static str = "correct horse";

    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            fail_refresh: false,
            confirm_sign_up: false,
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn with_failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    /// Sign-ups wait for email confirmation instead of signing in.
    pub fn with_email_confirmation(mut self) -> Self {
        self.confirm_sign_up = true;
        self
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if password != Self::PASSWORD {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(auth_session(self.user_id, email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        if self.confirm_sign_up {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        Ok(SignUpOutcome::SignedIn(auth_session(self.user_id, email)))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<AuthSession, AuthError> {
        if self.fail_refresh {
            return Err(AuthError::Api {
                status: 400,
                message: "Invalid Refresh Token".to_string(),
            });
        }
        let mut session = auth_session(self.user_id, "refreshed@example.com");
        session.access_token = "refreshed-token".to_string();
        Ok(session)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

/// Handles on the doubles behind a test `AppState`.
pub struct TestApp {
    pub state: AppState,
    pub auth: Arc<FakeAuth>,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
}

impl TestApp {
    pub fn new(generator: ScriptedGenerator) -> Self {
        Self::with_auth(FakeAuth::new(), generator)
    }

    pub fn with_auth(auth: FakeAuth, generator: ScriptedGenerator) -> Self {
        let auth = Arc::new(auth);
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(generator);
        let state = AppState {
            auth: auth.clone(),
            store: store.clone(),
            generator: generator.clone(),
            config: Config::for_tests("http://127.0.0.1:9"),
        };
        TestApp {
            state,
            auth,
            store,
            generator,
        }
    }
}
