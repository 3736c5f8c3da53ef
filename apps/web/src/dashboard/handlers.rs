//! Dashboard views: list, preview, delete, PDF download, and the JSON list/delete API.

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dashboard::state::{self, DashboardState, ListState};
use crate::errors::AppError;
use crate::export::export_pdf;
use crate::models::Document;
use crate::notifications::{self, Notification};
use crate::session::{ApiUser, RequireUser, SessionUser};
use crate::state::AppState;
use crate::views::{render, Chrome};

/// One document as the list and the preview show it.
pub struct DocumentView {
    pub id: Uuid,
    pub title: String,
    pub type_label: &'static str,
    pub created: String,
    pub text: String,
}

impl From<&Document> for DocumentView {
    fn from(doc: &Document) -> Self {
        DocumentView {
            id: doc.id,
            title: doc.title.clone(),
            type_label: doc.doc_type.label(),
            created: doc.created_at.format("%B %-d, %Y").to_string(),
            text: doc.content.text.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: Chrome,
    pub loading: bool,
    pub documents: Vec<DocumentView>,
    pub preview: Option<DocumentView>,
}

async fn dashboard_page(
    session: &Session,
    user: &SessionUser,
    dashboard: &DashboardState,
) -> Result<Response, AppError> {
    let loading = matches!(dashboard.list, ListState::Idle | ListState::Loading);
    let chrome = if loading {
        Chrome::keep_notifications(Some(user))
    } else {
        Chrome::load(session, Some(user)).await
    };
    let page = DashboardTemplate {
        chrome,
        loading,
        documents: dashboard.documents().iter().map(DocumentView::from).collect(),
        preview: dashboard.selected_document().map(DocumentView::from),
    };
    Ok(render(&page)?.into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// HTML
// ────────────────────────────────────────────────────────────────────────────

/// GET /dashboard
///
/// Starts a fresh load and answers straight away with the loading indicator. The
/// page then navigates to `/dashboard/load`, which does the fetch.
pub async fn handle_dashboard(
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Response, AppError> {
    let mut dashboard = state::load(&session).await?;
    dashboard.begin_load();
    state::save(&session, &dashboard).await?;
    dashboard_page(&session, &user, &dashboard).await
}

/// GET /dashboard/load
///
/// Fetches the owner's documents and shows the list. A failed fetch shows an
/// empty list.
pub async fn handle_load(
    State(app): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Redirect, AppError> {
    let mut dashboard = state::load(&session).await?;
    dashboard.begin_load();

    let result = app.store.list(user.owner()).await;
    if let Err(e) = dashboard.finish_load(result) {
        warn!(user_id = %user.id, "Failed to load documents: {e}");
        notifications::push(&session, Notification::error("Failed to load documents")).await;
    }
    state::save(&session, &dashboard).await?;
    Ok(Redirect::to("/dashboard/list"))
}

/// GET /dashboard/list
///
/// Renders the current list without fetching, closing any open preview.
/// While a load is pending this is the loading indicator again.
pub async fn handle_list(
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Response, AppError> {
    let mut dashboard = state::load(&session).await?;
    if dashboard.list == ListState::Idle {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    dashboard.close_preview();
    state::save(&session, &dashboard).await?;
    dashboard_page(&session, &user, &dashboard).await
}

/// GET /dashboard/documents/:id
pub async fn handle_preview(
    RequireUser(user): RequireUser,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let mut dashboard = state::load(&session).await?;
    if !dashboard.is_loaded() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    if !dashboard.select(id) {
        notifications::push(&session, Notification::error("Document not found")).await;
        return Ok(Redirect::to("/dashboard/list").into_response());
    }
    state::save(&session, &dashboard).await?;
    dashboard_page(&session, &user, &dashboard).await
}

/// POST /dashboard/documents/:id/delete
///
/// The remote delete must succeed before the document leaves the local list.
pub async fn handle_delete(
    State(app): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    match app.store.delete(user.owner(), id).await {
        Ok(()) => {
            let mut dashboard = state::load(&session).await?;
            dashboard.remove(id);
            state::save(&session, &dashboard).await?;
            info!(user_id = %user.id, "Deleted document {id}");
            notifications::push(&session, Notification::success("Document deleted successfully"))
                .await;
        }
        Err(e) => {
            warn!(user_id = %user.id, "Failed to delete document {id}: {e}");
            notifications::push(&session, Notification::error("Failed to delete document")).await;
        }
    }
    Ok(Redirect::to("/dashboard/list"))
}

/// GET /dashboard/documents/:id/pdf
///
/// Serves the PDF as an attachment. On failure the user goes back to where the
/// button was (preview or list) with an error notification.
pub async fn handle_download_pdf(
    RequireUser(user): RequireUser,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let dashboard = state::load(&session).await?;
    let back = if dashboard.selected == Some(id) {
        format!("/dashboard/documents/{id}")
    } else {
        "/dashboard/list".to_string()
    };

    let result = match dashboard.find(id) {
        Some(doc) => export_pdf(doc).await.map_err(AppError::from),
        None => Err(AppError::NotFound(format!("Document {id} not found"))),
    };

    match result {
        Ok(pdf) => {
            info!(user_id = %user.id, "Exported {}", pdf.file_name);
            notifications::push(&session, Notification::success("Document downloaded successfully"))
                .await;
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, pdf.content_disposition),
                ],
                bytes::Bytes::from(pdf.bytes),
            )
                .into_response())
        }
        Err(e) => {
            warn!(user_id = %user.id, "PDF export failed for {id}: {e}");
            notifications::push(
                &session,
                Notification::error("Failed to download document. Please try again."),
            )
            .await;
            Ok(Redirect::to(&back).into_response())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JSON
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/documents
pub async fn handle_list_documents(
    State(app): State<AppState>,
    ApiUser(user): ApiUser,
) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(app.store.list(user.owner()).await?))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_delete_document(
    State(app): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app.store.delete(user.owner(), id).await?;
    info!(user_id = %user.id, "Deleted document {id}");
    Ok(StatusCode::NO_CONTENT)
}
