use std::sync::Arc;

use anyhow::anyhow;

use recap_db::Database;
use recap_summarizer::SummarizerClient;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

/// Shared application state, built once at startup and injected into every
/// handler. The database handle lives here rather than in module globals.
pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub summarizer: SummarizerClient,
}

impl AppStateInner {
    /// Runs a database closure off the async runtime. rusqlite calls block on
    /// a mutex plus disk I/O, so they never run directly on a worker thread.
    pub async fn run_db<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| ApiError::Internal(anyhow!("blocking task join error: {}", e)))?
            .map_err(ApiError::Internal)
    }
}

/// State over an in-memory database, for handler tests.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use std::time::Duration;

    Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory db"),
        jwt_secret: "test-secret".to_string(),
        summarizer: SummarizerClient::new("http://127.0.0.1:9", Duration::from_secs(1))
            .expect("summarizer client"),
    })
}
