//! Local preview server.
//!
//! Serves the generated document from a temp directory on an ephemeral
//! localhost port. Single-instance: starting a new preview stops the
//! previous one first, so there is never more than one preview alive.

use anyhow::Context;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::info;

use crate::errors::AppError;

pub struct PreviewServer {
    running: Option<RunningPreview>,
}

struct RunningPreview {
    handle: JoinHandle<()>,
    // Held so the served files outlive the spawned task.
    _dir: tempfile::TempDir,
    url: String,
}

impl PreviewServer {
    pub fn new() -> Self {
        Self { running: None }
    }

    /// Writes the document to a fresh temp directory and serves it on an
    /// ephemeral port, replacing any previous preview. Returns the URL.
    pub async fn start(&mut self, html: &str) -> Result<String, AppError> {
        self.stop();

        let dir = tempfile::tempdir().context("Failed to create preview directory")?;
        let index = dir.path().join("index.html");
        std::fs::write(&index, html).context("Failed to write preview document")?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind preview server")?;
        let addr = listener
            .local_addr()
            .context("Failed to read preview server address")?;

        let app = Router::new().fallback_service(ServeDir::new(dir.path()));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = format!("http://{addr}/");
        info!("Preview server listening on {url}");
        self.running = Some(RunningPreview {
            handle,
            _dir: dir,
            url: url.clone(),
        });
        Ok(url)
    }

    /// Stops the running preview, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
            info!("Stopped preview server at {}", running.url);
        }
    }
}

impl Default for PreviewServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PreviewServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_serves_the_document() {
        let mut server = PreviewServer::new();
        let url = server.start("<p>hello preview</p>").await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:"));

        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "<p>hello preview</p>");
    }

    #[tokio::test]
    async fn test_restart_replaces_the_document() {
        let mut server = PreviewServer::new();
        server.start("<p>one</p>").await.unwrap();
        let url = server.start("<p>two</p>").await.unwrap();

        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "<p>two</p>");
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_clears_the_instance() {
        let mut server = PreviewServer::new();
        server.start("<p>x</p>").await.unwrap();
        assert!(server.running.is_some());
        server.stop();
        server.stop();
        assert!(server.running.is_none());
    }
}
