//! In-process `DocumentStore` used by the handler and flow tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::{Document, NewDocument};
use crate::store::{DocumentStore, Owner, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail with a 503.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Every stored document regardless of owner.
    pub fn all(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, owner: Owner<'_>) -> Result<Vec<Document>, StoreError> {
        self.take_failure()?;
        let mut docs: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == owner.user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn create(
        &self,
        _owner: Owner<'_>,
        document: NewDocument,
    ) -> Result<Document, StoreError> {
        self.take_failure()?;
        let mut documents = self.documents.lock().unwrap();
        // Strictly increasing timestamps even when two inserts land in the same tick.
        let created_at = documents
            .iter()
            .map(|d| d.created_at + Duration::milliseconds(1))
            .max()
            .map_or_else(Utc::now, |next| next.max(Utc::now()));

        let stored = Document {
            id: Uuid::new_v4(),
            user_id: document.user_id,
            doc_type: document.doc_type,
            title: document.title,
            content: document.content,
            job_details: document.job_details,
            created_at,
        };
        documents.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, owner: Owner<'_>, id: Uuid) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|d| !(d.id == id && d.user_id == owner.user_id));
        if documents.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
