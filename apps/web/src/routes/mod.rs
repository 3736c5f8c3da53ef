pub mod health;
pub mod home;

use axum::{
    routing::{delete, get, post},
    Router,
};
use time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::dashboard::handlers as dashboard;
use crate::generation::handlers as generation;
use crate::session::handlers as auth;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.session_secure_cookie)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(home::home_handler))
        // Auth
        .route("/auth", get(auth::handle_auth_page))
        .route("/auth/sign-in", post(auth::handle_sign_in))
        .route("/auth/sign-up", post(auth::handle_sign_up))
        .route("/auth/sign-out", post(auth::handle_sign_out))
        // Generator
        .route(
            "/generate",
            get(generation::handle_generator_page).post(generation::handle_generate),
        )
        // Dashboard
        .route("/dashboard", get(dashboard::handle_dashboard))
        .route("/dashboard/load", get(dashboard::handle_load))
        .route("/dashboard/list", get(dashboard::handle_list))
        .route("/dashboard/documents/:id", get(dashboard::handle_preview))
        .route(
            "/dashboard/documents/:id/delete",
            post(dashboard::handle_delete),
        )
        .route(
            "/dashboard/documents/:id/pdf",
            get(dashboard::handle_download_pdf),
        )
        // Documents API
        .route(
            "/api/v1/documents",
            get(dashboard::handle_list_documents).post(generation::handle_create_document),
        )
        .route(
            "/api/v1/documents/:id",
            delete(dashboard::handle_delete_document),
        )
        .layer(session_layer)
        .with_state(state)
}
