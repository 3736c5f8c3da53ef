use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::session::AuthProvider;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Hosted identity service. Only the session provider calls it.
    pub auth: Arc<dyn AuthProvider>,
    /// Hosted `documents` collection.
    pub store: Arc<dyn DocumentStore>,
    /// Hosted model endpoint. Default: `LlmClient`.
    pub generator: Arc<dyn TextGenerator>,
    pub config: Config,
}
