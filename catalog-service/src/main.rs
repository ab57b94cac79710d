use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use catalog_service::app_state::AppState;
use catalog_service::category_handlers::{
    create_category, delete_category, get_category, list_categories, update_category,
};
use catalog_service::feed::stock_feed;
use catalog_service::field_map::PRODUCT_FIELDS;
use catalog_service::notifier::{StaticAlertRoutes, StockNotifier, StockUpdate};
use catalog_service::product_handlers::{
    create_product, delete_product, get_product, list_products, update_product,
};
use catalog_service::stock_handlers::{adjust_stock, list_stock};
use common_notify::AlertSink;
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
use common_notify::KafkaAlertSink;
#[cfg(not(any(feature = "kafka", feature = "kafka-producer")))]
use common_notify::NoopAlertSink;
use common_observability::CatalogMetrics;
use prometheus::{Encoder, TextEncoder};
use sqlx::PgPool;
use std::{env, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_STOCK_FEED_CAPACITY: usize = 256;

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8_lossy(&buf).to_string(),
    )
}

// Count every error response by the machine code the handlers stamp into
// X-Error-Code, so alerting can tell validation noise from real failures.
async fn error_metrics_mw(
    State(metrics): State<Arc<CatalogMetrics>>,
    req: axum::http::Request<Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("x-error-code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        metrics
            .http_errors_total
            .with_label_values(&["catalog-service", code, status.as_str()])
            .inc();
    }
    resp
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
fn build_alert_sink() -> anyhow::Result<Arc<dyn AlertSink>> {
    use rdkafka::producer::FutureProducer;
    let producer: FutureProducer = rdkafka::ClientConfig::new()
        .set(
            "bootstrap.servers",
            &env::var("KAFKA_BOOTSTRAP").unwrap_or("localhost:9092".into()),
        )
        .create()
        .context("failed to create kafka producer")?;
    let topic = env::var("ALERT_TOPIC").unwrap_or_else(|_| "catalog.alerts".to_string());
    Ok(Arc::new(KafkaAlertSink::new(producer, topic)))
}

#[cfg(not(any(feature = "kafka", feature = "kafka-producer")))]
fn build_alert_sink() -> anyhow::Result<Arc<dyn AlertSink>> {
    Ok(Arc::new(NoopAlertSink))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    // A broken mapping table means every ordering parameter misbehaves;
    // refuse to serve at all.
    PRODUCT_FIELDS
        .validate()
        .context("product field map is inconsistent")?;

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = PgPool::connect(&database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let feed_capacity = env::var("STOCK_FEED_CAPACITY")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_STOCK_FEED_CAPACITY);
    // Lossy realtime channel: slow WebSocket clients lag instead of blocking writers.
    let (feed_tx, _feed_rx) = broadcast::channel::<StockUpdate>(feed_capacity);

    let metrics = Arc::new(CatalogMetrics::new());
    let sink = build_alert_sink()?;
    let notifier = StockNotifier::new(
        feed_tx,
        sink,
        Arc::new(StaticAlertRoutes::default()),
        metrics.clone(),
    );

    let state = AppState { db, notifier, metrics: metrics.clone() };

    let allowed_origins = [
        "http://localhost:3000",
        "http://localhost:5173",
    ];
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-user-name"),
            HeaderName::from_static("x-user-email"),
            HeaderName::from_static("x-roles"),
            HeaderName::from_static("x-trace-id"),
        ]);

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/stock", patch(adjust_stock))
        .route("/categories", post(create_category).get(list_categories))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/stock", get(list_stock))
        .route("/ws/stock", get(stock_feed))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .layer(middleware::from_fn_with_state(metrics, error_metrics_mw))
        .layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8086);
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::from((ip, port));
    tracing::info!(%addr, "starting catalog-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
