use crate::product_handlers::Product;
use common_notify::{Alert, AlertSink, AlertTag};
use common_observability::CatalogMetrics;
use common_security::{Actor, Role};
use common_stock::StockStatus;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Payload pushed onto the shared stock topic for every create/update.
/// Field names and types are a frontend contract; change them and the live
/// stock displays go blank.
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdate {
    pub product_id: i64,
    pub name: String,
    pub current_stock: i32,
    pub stock_status: StockStatus,
}

/// Which roles receive which alert kind. Injected so deployments can re-route
/// alerts without touching the notifier.
pub trait AlertRoutes: Send + Sync {
    fn roles_for(&self, tag: AlertTag) -> &[Role];
}

pub struct StaticAlertRoutes {
    product_added: Vec<Role>,
    product_updated: Vec<Role>,
    low_stock: Vec<Role>,
    out_of_stock: Vec<Role>,
}

impl Default for StaticAlertRoutes {
    fn default() -> Self {
        Self {
            product_added: vec![Role::PurchasingManager, Role::SystemAdministrator],
            product_updated: vec![Role::PurchasingManager, Role::InventoryClerk],
            low_stock: vec![Role::PurchasingManager, Role::InventoryClerk],
            out_of_stock: vec![
                Role::PurchasingManager,
                Role::SystemAdministrator,
                Role::InventoryClerk,
            ],
        }
    }
}

impl AlertRoutes for StaticAlertRoutes {
    fn roles_for(&self, tag: AlertTag) -> &[Role] {
        match tag {
            AlertTag::ProductAdded => &self.product_added,
            AlertTag::ProductUpdated => &self.product_updated,
            AlertTag::LowStock => &self.low_stock,
            AlertTag::OutOfStock => &self.out_of_stock,
        }
    }
}

/// Post-write notification fan-out. Invoked only after the triggering write
/// has succeeded; every emission is independently caught, so a dead broker or
/// an empty feed never surfaces as a request failure and never suppresses the
/// other emissions.
#[derive(Clone)]
pub struct StockNotifier {
    feed: broadcast::Sender<StockUpdate>,
    sink: Arc<dyn AlertSink>,
    routes: Arc<dyn AlertRoutes>,
    metrics: Arc<CatalogMetrics>,
}

impl StockNotifier {
    pub fn new(
        feed: broadcast::Sender<StockUpdate>,
        sink: Arc<dyn AlertSink>,
        routes: Arc<dyn AlertRoutes>,
        metrics: Arc<CatalogMetrics>,
    ) -> Self {
        Self { feed, sink, routes, metrics }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StockUpdate> {
        self.feed.subscribe()
    }

    pub async fn product_created(&self, product: &Product, actor: &Actor) {
        self.broadcast(product);
        self.alert(
            AlertTag::ProductAdded,
            product,
            actor,
            "New product added",
            format!(
                "\"{}\" was added to the catalog with {} units on hand.",
                product.name, product.stock_current
            ),
        )
        .await;
    }

    pub async fn product_updated(&self, product: &Product, old_stock: i32, actor: &Actor) {
        self.broadcast(product);
        self.alert(
            AlertTag::ProductUpdated,
            product,
            actor,
            "Product updated",
            format!("\"{}\" was updated by {}.", product.name, actor.label()),
        )
        .await;

        // Threshold alerts fire only on an actual stock movement, evaluated
        // against the new value. Out-of-stock wins over low-stock.
        if old_stock != product.stock_current {
            if product.stock_current == 0 {
                self.alert(
                    AlertTag::OutOfStock,
                    product,
                    actor,
                    "Out of stock",
                    format!("\"{}\" is out of stock.", product.name),
                )
                .await;
            } else if product.stock_current <= product.stock_minimum {
                self.alert(
                    AlertTag::LowStock,
                    product,
                    actor,
                    "Low stock",
                    format!(
                        "\"{}\" is down to {} units (minimum {}).",
                        product.name, product.stock_current, product.stock_minimum
                    ),
                )
                .await;
            }
        }
    }

    fn broadcast(&self, product: &Product) {
        let update = StockUpdate {
            product_id: product.id,
            name: product.name.clone(),
            current_stock: product.stock_current,
            stock_status: StockStatus::evaluate(
                product.stock_current,
                product.stock_minimum,
                product.stock_maximum,
            ),
        };
        // send only errors when nobody is subscribed; the feed is lossy and
        // best-effort either way.
        let _ = self.feed.send(update);
        self.metrics.stock_broadcasts_total.inc();
    }

    async fn alert(
        &self,
        tag: AlertTag,
        product: &Product,
        actor: &Actor,
        title: &str,
        message: String,
    ) {
        let roles = self.routes.roles_for(tag).to_vec();
        let alert = Alert::new(tag, title, message, actor.clone(), roles)
            .with_action_url(format!("/inventory/products/{}", product.id))
            .with_metadata(json!({
                "product_id": product.id,
                "current_stock": product.stock_current,
                "minimum_stock": product.stock_minimum,
            }));
        self.metrics
            .stock_alerts_total
            .with_label_values(&[tag.as_str()])
            .inc();
        if let Err(err) = self.sink.deliver(&alert).await {
            self.metrics.alert_delivery_failures_total.inc();
            warn!(?err, product_id = product.id, tag = tag.as_str(), "Failed to deliver stock alert");
        }
    }
}
