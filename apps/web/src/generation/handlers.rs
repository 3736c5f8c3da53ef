//! Axum route handlers for document generation (HTML form and JSON API).

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use tower_sessions::Session;

use crate::errors::AppError;
use crate::generation::generator::{generate_document, GenerationForm};
use crate::models::{Document, DocumentType};
use crate::notifications::{self, Notification};
use crate::session::{ApiUser, RequireUser, SessionUser};
use crate::state::AppState;
use crate::views::{render, Chrome};

const SAVE_FAILED: &str = "Your document was generated but could not be saved. Please try again.";

#[derive(Template)]
#[template(path = "generator.html")]
pub struct GeneratorTemplate {
    pub chrome: Chrome,
    pub form: GenerationForm,
    pub error: Option<String>,
}

async fn generator_page(
    session: &Session,
    user: &SessionUser,
    status: StatusCode,
    form: GenerationForm,
    error: Option<String>,
) -> Result<Response, AppError> {
    let page = GeneratorTemplate {
        chrome: Chrome::load(session, Some(user)).await,
        form,
        error,
    };
    Ok((status, render(&page)?).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// HTML
// ────────────────────────────────────────────────────────────────────────────

/// GET /generate
pub async fn handle_generator_page(
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Response, AppError> {
    let form = GenerationForm {
        doc_type: DocumentType::Resume.as_str().to_string(),
        ..GenerationForm::default()
    };
    generator_page(&session, &user, StatusCode::OK, form, None).await
}

/// POST /generate
///
/// Success redirects to the dashboard. Every failure re-renders the form with the
/// entered values so nothing typed is lost.
pub async fn handle_generate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Form(form): Form<GenerationForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            let message = e.user_message();
            return generator_page(
                &session,
                &user,
                StatusCode::UNPROCESSABLE_ENTITY,
                form,
                Some(message),
            )
            .await;
        }
    };

    let result = generate_document(
        state.generator.as_ref(),
        state.store.as_ref(),
        user.owner(),
        &input,
    )
    .await;

    match result {
        Ok(_) => {
            notifications::push(&session, Notification::success("Document generated successfully"))
                .await;
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(AppError::Generation(e)) => {
            notifications::push(&session, Notification::error("Failed to generate document"))
                .await;
            generator_page(
                &session,
                &user,
                StatusCode::BAD_GATEWAY,
                form,
                Some(e.user_message().to_string()),
            )
            .await
        }
        Err(AppError::Store(e)) => {
            tracing::error!(user_id = %user.id, "Failed to save generated document: {e}");
            notifications::push(&session, Notification::error("Failed to save document")).await;
            generator_page(
                &session,
                &user,
                StatusCode::BAD_GATEWAY,
                form,
                Some(SAVE_FAILED.to_string()),
            )
            .await
        }
        Err(e) => Err(e),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JSON
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/documents
///
/// Same flow as the form: generate, persist, return the stored row.
pub async fn handle_create_document(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(form): Json<GenerationForm>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let input = form.validate()?;
    let document = generate_document(
        state.generator.as_ref(),
        state.store.as_ref(),
        user.owner(),
        &input,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(document)))
}
