use crate::notifier::StockNotifier;
use common_observability::CatalogMetrics;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state used by handlers (kept out of main.rs so tests
/// and library code can build it).
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub notifier: StockNotifier,
    pub metrics: Arc<CatalogMetrics>,
}
