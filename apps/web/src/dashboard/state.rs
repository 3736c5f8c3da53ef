//! Dashboard view state: the per-browser document list and the open preview.
//!
//! `list` walks Idle → Loading → Loaded. `selected` is orthogonal: at most one
//! document is previewed, and it must be one of the loaded documents.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::Document;
use crate::store::StoreError;

const DASHBOARD_KEY: &str = "dashboard";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ListState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<Document>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub list: ListState,
    pub selected: Option<Uuid>,
}

impl DashboardState {
    /// Starts a fetch. Any open preview is closed.
    pub fn begin_load(&mut self) {
        self.list = ListState::Loading;
        self.selected = None;
    }

    /// Finishes a fetch. A failed fetch leaves an empty list; the error is handed back
    /// to the caller for notification.
    pub fn finish_load(
        &mut self,
        result: Result<Vec<Document>, StoreError>,
    ) -> Result<(), StoreError> {
        match result {
            Ok(documents) => {
                self.list = ListState::Loaded(documents);
                Ok(())
            }
            Err(e) => {
                self.list = ListState::Loaded(Vec::new());
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.list, ListState::Loaded(_))
    }

    pub fn documents(&self) -> &[Document] {
        match &self.list {
            ListState::Loaded(documents) => documents,
            _ => &[],
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&Document> {
        self.documents().iter().find(|d| d.id == id)
    }

    /// Opens the preview for `id`, replacing any previous one.
    /// Returns false and leaves the state alone if `id` is not in the list.
    pub fn select(&mut self, id: Uuid) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn close_preview(&mut self) {
        self.selected = None;
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.selected.and_then(|id| self.find(id))
    }

    /// Drops a document from the list. Call only after the remote delete succeeded.
    pub fn remove(&mut self, id: Uuid) {
        if let ListState::Loaded(documents) = &mut self.list {
            documents.retain(|d| d.id != id);
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
    }
}

pub async fn load(session: &Session) -> Result<DashboardState, tower_sessions::session::Error> {
    Ok(session
        .get::<DashboardState>(DASHBOARD_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn save(
    session: &Session,
    state: &DashboardState,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(DASHBOARD_KEY, state).await
}

/// Drops the cached list, e.g. on sign-out.
pub async fn forget(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(DASHBOARD_KEY).await?;
    Ok(())
}
