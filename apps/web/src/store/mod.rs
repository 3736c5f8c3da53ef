//! Document Store Client: create/list/delete against the hosted `documents` collection.
//!
//! No update operation: documents are immutable once created.
//! Ownership scoping is enforced by the hosted store; every call still carries the
//! owner's bearer token and filters by `user_id`.

pub mod supabase;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Document, NewDocument};

pub use supabase::SupabaseStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Document {0} not found")]
    NotFound(Uuid),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The identity a store call acts on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'a> {
    pub user_id: Uuid,
    pub access_token: &'a str,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of `owner`, newest first. Empty when the owner has none.
    async fn list(&self, owner: Owner<'_>) -> Result<Vec<Document>, StoreError>;

    /// Inserts one document and returns the stored row.
    async fn create(&self, owner: Owner<'_>, document: NewDocument)
        -> Result<Document, StoreError>;

    /// Removes exactly one document. A missing id is `StoreError::NotFound`.
    async fn delete(&self, owner: Owner<'_>, id: Uuid) -> Result<(), StoreError>;
}
