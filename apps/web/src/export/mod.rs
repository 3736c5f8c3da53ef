// PDF export of a stored document.
// Layout and serialisation are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod fragment;
pub mod pdf;

use thiserror::Error;

use crate::models::Document;
pub use fragment::ExportFragment;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF write failed: {0}")]
    Pdf(String),

    #[error("export task failed: {0}")]
    Task(String),
}

/// A rendered PDF ready to be sent as an attachment.
#[derive(Debug)]
pub struct ExportedPdf {
    pub file_name: String,
    pub content_disposition: String,
    pub bytes: Vec<u8>,
}

pub async fn export_pdf(doc: &Document) -> Result<ExportedPdf, ExportError> {
    let fragment = ExportFragment::from_document(doc);
    let bytes = tokio::task::spawn_blocking(move || pdf::render(&fragment))
        .await
        .map_err(|e| ExportError::Task(format!("spawn_blocking failed in export: {e}")))??;

    tracing::debug!("Exported document {} ({} bytes)", doc.id, bytes.len());

    Ok(ExportedPdf {
        file_name: fragment::file_name(&doc.title),
        content_disposition: fragment::content_disposition(&doc.title),
        bytes,
    })
}
