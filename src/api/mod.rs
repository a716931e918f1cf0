use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::db::PartitionStore;

mod media;
mod transfer;

pub struct AppState {
    /// Reads share the lock; writes hold it until the snapshot is on disk
    pub catalog: RwLock<Catalog>,
    pub store: PartitionStore,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(catalog: Catalog, store: PartitionStore, config: AppConfig) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            store,
            config,
        }
    }

    /// Write the snapshot after a mutation. A failed write is logged and the
    /// in-memory change stays.
    async fn persist(&self, catalog: &Catalog) {
        if let Err(e) = self.store.save(catalog).await {
            tracing::error!("Failed to save catalog: {:#}", e);
        }
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api/media",
        Router::new()
            .merge(transfer::routes())
            .merge(media::routes()),
    )
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
