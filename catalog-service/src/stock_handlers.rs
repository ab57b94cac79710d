use crate::app_state::AppState;
use crate::product_handlers::{fetch_product, validate_stock_fields, Product, PRODUCT_COLUMNS};
use axum::{
    extract::{Path, State},
    Json,
};
use common_http_errors::ApiError;
use common_security::{ensure_any_role, Role, SecurityCtxExtractor};
use common_stock::{in_stock, StockStatus};
use serde::{Deserialize, Serialize};

pub(crate) const STOCK_VIEW_ROLES: &[Role] = &[
    Role::SystemAdministrator,
    Role::PurchasingManager,
    Role::InventoryClerk,
    Role::Support,
];

pub(crate) const STOCK_ADJUST_ROLES: &[Role] = &[
    Role::SystemAdministrator,
    Role::PurchasingManager,
    Role::InventoryClerk,
];

const LIST_STOCK_SQL: &str =
    "SELECT id, name, stock_current, stock_minimum, stock_maximum FROM products ORDER BY name";

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: i64,
    name: String,
    stock_current: i32,
    stock_minimum: i32,
    stock_maximum: i32,
}

#[derive(Debug, Serialize)]
pub struct StockRecord {
    pub product_id: i64,
    pub name: String,
    pub current_stock: i32,
    pub minimum_stock: i32,
    pub maximum_stock: i32,
    pub stock_status: StockStatus,
    pub in_stock: bool,
}

/// Absolute (`set`) or relative (`delta`) stock adjustment; exactly one of
/// the two must be present.
#[derive(Deserialize)]
pub struct StockPatch {
    #[serde(default)]
    pub set: Option<i32>,
    #[serde(default)]
    pub delta: Option<i32>,
}

enum StockOp {
    Set(i32),
    Delta(i32),
}

pub async fn list_stock(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
) -> Result<Json<Vec<StockRecord>>, ApiError> {
    ensure_any_role(&sec, STOCK_VIEW_ROLES)
        .map_err(|_| ApiError::ForbiddenMissingRole { role: "inventory_clerk", trace_id: sec.trace_id })?;

    let rows = sqlx::query_as::<_, StockRow>(LIST_STOCK_SQL)
        .fetch_all(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, sec.trace_id))?;

    let records = rows
        .into_iter()
        .map(|row| StockRecord {
            product_id: row.id,
            name: row.name,
            current_stock: row.stock_current,
            minimum_stock: row.stock_minimum,
            maximum_stock: row.stock_maximum,
            stock_status: StockStatus::evaluate(row.stock_current, row.stock_minimum, row.stock_maximum),
            in_stock: in_stock(row.stock_current),
        })
        .collect();

    Ok(Json(records))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(product_id): Path<i64>,
    Json(patch): Json<StockPatch>,
) -> Result<Json<Product>, ApiError> {
    ensure_any_role(&sec, STOCK_ADJUST_ROLES)
        .map_err(|_| ApiError::ForbiddenMissingRole { role: "inventory_clerk", trace_id: sec.trace_id })?;

    // Shape check before touching the database; the adjustment itself needs
    // the current row.
    let op = match (patch.set, patch.delta) {
        (Some(value), None) => StockOp::Set(value),
        (None, Some(delta)) => StockOp::Delta(delta),
        _ => {
            return Err(ApiError::validation(
                "provide exactly one of \"set\" or \"delta\"",
                sec.trace_id,
            ))
        }
    };

    let existing = fetch_product(&state, product_id, sec.trace_id).await?;

    let new_stock = match op {
        StockOp::Set(value) => value,
        StockOp::Delta(delta) => existing.stock_current.checked_add(delta).ok_or_else(|| {
            ApiError::validation("stock adjustment overflows the stock counter", sec.trace_id)
        })?,
    };
    if new_stock < 0 {
        return Err(ApiError::validation(
            format!(
                "stock for \"{}\" cannot go below zero (requested {})",
                existing.name, new_stock
            ),
            sec.trace_id,
        ));
    }
    validate_stock_fields(new_stock, existing.stock_minimum, existing.stock_maximum, sec.trace_id)?;

    let sql = format!(
        "UPDATE products SET stock_current = $1, updated_at = NOW() WHERE id = $2 \
         RETURNING {PRODUCT_COLUMNS}"
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(new_stock)
        .bind(product_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, sec.trace_id))?;

    state
        .notifier
        .product_updated(&product, existing.stock_current, &sec.actor)
        .await;

    Ok(Json(product))
}
