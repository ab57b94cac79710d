use prometheus::{IntCounter, IntCounterVec, IntGauge, Registry};

#[derive(Clone)]
pub struct CatalogMetrics {
    pub registry: Registry,
    pub http_errors_total: IntCounterVec,
    pub stock_broadcasts_total: IntCounter,
    pub stock_alerts_total: IntCounterVec,
    pub alert_delivery_failures_total: IntCounter,
    pub ws_clients: IntGauge,
}

impl CatalogMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let http_errors_total = IntCounterVec::new(
            prometheus::Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )
        .unwrap();
        let stock_broadcasts_total = IntCounter::new(
            "stock_broadcasts_total",
            "Stock update events pushed onto the shared broadcast topic",
        )
        .unwrap();
        let stock_alerts_total = IntCounterVec::new(
            prometheus::Opts::new(
                "stock_alerts_total",
                "Role-targeted alerts handed to the notification sink",
            ),
            &["tag"],
        )
        .unwrap();
        let alert_delivery_failures_total = IntCounter::new(
            "alert_delivery_failures_total",
            "Alert deliveries the sink reported as failed (logged and swallowed)",
        )
        .unwrap();
        let ws_clients = IntGauge::new(
            "ws_clients",
            "WebSocket subscribers currently attached to the stock feed",
        )
        .unwrap();
        let _ = registry.register(Box::new(http_errors_total.clone()));
        let _ = registry.register(Box::new(stock_broadcasts_total.clone()));
        let _ = registry.register(Box::new(stock_alerts_total.clone()));
        let _ = registry.register(Box::new(alert_delivery_failures_total.clone()));
        let _ = registry.register(Box::new(ws_clients.clone()));
        CatalogMetrics {
            registry,
            http_errors_total,
            stock_broadcasts_total,
            stock_alerts_total,
            alert_delivery_failures_total,
            ws_clients,
        }
    }
}

impl Default for CatalogMetrics {
    fn default() -> Self {
        Self::new()
    }
}
