use std::sync::Arc;

use anyhow::anyhow;

use jibe_core::Gate;
use jibe_db::Store;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

/// Everything a handler needs, built once at startup.
pub struct AppStateInner {
    pub store: Arc<dyn Store>,
    pub gate: Gate,
}

impl AppStateInner {
    pub fn new(store: Arc<dyn Store>, gate: Gate) -> AppState {
        Arc::new(Self { store, gate })
    }
}

/// Run a blocking store call off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Store) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
        .map_err(ApiError::Internal)
}
