use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cache::ArtifactCache;
use crate::llm_client::ChatModel;
use crate::preview::PreviewServer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Chat model behind a trait object so tests can script replies.
    pub model: Arc<dyn ChatModel>,
    pub cache: ArtifactCache,
    /// Single-instance preview server; the mutex serializes restarts.
    pub preview: Arc<Mutex<PreviewServer>>,
}
