use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Document, NewDocument};
use crate::store::{DocumentStore, Owner, StoreError};

const DOCUMENTS_PATH: &str = "/rest/v1/documents";

#[derive(Debug, Deserialize)]
struct RestError {
    message: String,
}

/// `DocumentStore` backed by the hosted database's REST interface (PostgREST).
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            anon_key,
        }
    }

    fn documents_url(&self) -> String {
        format!("{}{}", self.base_url, DOCUMENTS_PATH)
    }

    /// Project key plus the user's token, so row-level security sees the owner.
    fn authorize(&self, builder: RequestBuilder, owner: Owner<'_>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(owner.access_token)
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn list(&self, owner: Owner<'_>) -> Result<Vec<Document>, StoreError> {
        let user_filter = format!("eq.{}", owner.user_id);
        let request = self.client.get(self.documents_url()).query(&[
            ("select", "*"),
            ("user_id", user_filter.as_str()),
            ("order", "created_at.desc"),
        ]);

        let response = check(self.authorize(request, owner).send().await?).await?;
        let documents: Vec<Document> = response.json().await?;

        debug!(
            "Listed {} documents for user {}",
            documents.len(),
            owner.user_id
        );
        Ok(documents)
    }

    async fn create(
        &self,
        owner: Owner<'_>,
        document: NewDocument,
    ) -> Result<Document, StoreError> {
        let request = self
            .client
            .post(self.documents_url())
            .header("Prefer", "return=representation")
            .json(&document);

        let response = check(self.authorize(request, owner).send().await?).await?;
        let mut rows: Vec<Document> = response.json().await?;

        let stored = rows.pop().ok_or_else(|| StoreError::Api {
            status: 200,
            message: "insert returned no rows".to_string(),
        })?;

        info!("Stored document {} for user {}", stored.id, owner.user_id);
        Ok(stored)
    }

    async fn delete(&self, owner: Owner<'_>, id: Uuid) -> Result<(), StoreError> {
        let id_filter = format!("eq.{id}");
        let user_filter = format!("eq.{}", owner.user_id);
        let request = self
            .client
            .delete(self.documents_url())
            .header("Prefer", "return=representation")
            .query(&[("id", id_filter.as_str()), ("user_id", user_filter.as_str())]);

        let response = check(self.authorize(request, owner).send().await?).await?;
        let removed: Vec<serde_json::Value> = response.json().await?;

        match removed.len() {
            0 => Err(StoreError::NotFound(id)),
            1 => {
                info!("Deleted document {} for user {}", id, owner.user_id);
                Ok(())
            }
            n => {
                // Primary key filter; more than one row means the table is not what we expect.
                warn!("Delete of document {} removed {} rows", id, n);
                Ok(())
            }
        }
    }
}

/// Passes successful responses through; turns anything else into `StoreError::Api`.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("Store API returned {}: {}", status, body);
    let message = serde_json::from_str::<RestError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}
