use crate::app_state::AppState;
use crate::field_map::PRODUCT_FIELDS;
use crate::{DEFAULT_MAXIMUM_STOCK, DEFAULT_MINIMUM_STOCK};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_http_errors::ApiError;
use common_money::Money;
use common_security::{ensure_any_role, Role, SecurityContext, SecurityCtxExtractor};
use common_stock::{in_stock, StockStatus};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use std::env;
use uuid::Uuid;

pub(crate) const PRODUCT_WRITE_ROLES: &[Role] =
    &[Role::SystemAdministrator, Role::PurchasingManager];

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, category_id, sku, price, discounted_price, \
     stock_current, stock_minimum, stock_maximum, active, image, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub sku: Option<String>,
    pub price: Money,
    pub discounted_price: Option<Money>,
    pub stock_current: i32,
    pub stock_minimum: i32,
    pub stock_maximum: i32,
    pub active: bool,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Responses speak the frontend contract: renamed fields plus the two derived
// stock fields, which exist only on the wire.
impl Serialize for Product {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let status = StockStatus::evaluate(self.stock_current, self.stock_minimum, self.stock_maximum);
        let mut state = serializer.serialize_struct("Product", 17)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("category", &self.category_id)?;
        state.serialize_field("sku", &self.sku)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("discount_price", &self.discounted_price)?;
        state.serialize_field("current_stock", &self.stock_current)?;
        state.serialize_field("minimum_stock", &self.stock_minimum)?;
        state.serialize_field("maximum_stock", &self.stock_maximum)?;
        state.serialize_field("stock_status", &status)?;
        state.serialize_field("in_stock", &in_stock(self.stock_current))?;
        state.serialize_field("active", &self.active)?;
        state.serialize_field("image", &self.image)?;
        state.serialize_field("image_url", &self.image)?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("updated_at", &self.updated_at)?;
        state.end()
    }
}

#[derive(Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: BigDecimal,
    #[serde(default)]
    pub discount_price: Option<BigDecimal>,
    #[serde(default)]
    pub current_stock: Option<i32>,
    #[serde(default)]
    pub minimum_stock: Option<i32>,
    #[serde(default)]
    pub maximum_stock: Option<i32>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: BigDecimal,
    #[serde(default)]
    pub discount_price: Option<BigDecimal>,
    pub current_stock: i32,
    pub minimum_stock: i32,
    pub maximum_stock: i32,
    pub active: bool,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ProductFilter {
    pub category: Option<i64>,
    pub active: Option<bool>,
    pub status: Option<StockStatus>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

fn default_product_image() -> String {
    env::var("DEFAULT_PRODUCT_IMAGE_URL")
        .unwrap_or_else(|_| "https://placehold.co/400x300?text=No+Image".to_string())
}

fn normalize_image_input(input: Option<String>) -> Option<String> {
    match input {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Some(default_product_image())
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    }
}

pub(crate) fn ensure_write_role(sec: &SecurityContext) -> Result<(), ApiError> {
    ensure_any_role(sec, PRODUCT_WRITE_ROLES)
        .map_err(|_| ApiError::ForbiddenMissingRole { role: "purchasing_manager", trace_id: sec.trace_id })
}

fn validate_name(name: &str, trace_id: Option<Uuid>) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty", trace_id));
    }
    Ok(())
}

pub(crate) fn validate_stock_fields(
    current: i32,
    minimum: i32,
    maximum: i32,
    trace_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if current < 0 {
        return Err(ApiError::validation(
            format!("current_stock must be non-negative, got {current}"),
            trace_id,
        ));
    }
    if minimum < 0 {
        return Err(ApiError::validation(
            format!("minimum_stock must be non-negative, got {minimum}"),
            trace_id,
        ));
    }
    if minimum > maximum {
        return Err(ApiError::validation(
            format!("minimum_stock ({minimum}) must not exceed maximum_stock ({maximum})"),
            trace_id,
        ));
    }
    Ok(())
}

fn validate_pricing(
    price: &Money,
    discount: Option<&Money>,
    trace_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if price.is_negative() {
        return Err(ApiError::validation("price must be non-negative", trace_id));
    }
    if let Some(discount) = discount {
        if discount.is_negative() {
            return Err(ApiError::validation("discount_price must be non-negative", trace_id));
        }
        if discount.inner() > price.inner() {
            return Err(ApiError::validation(
                "discount_price must not exceed price",
                trace_id,
            ));
        }
    }
    Ok(())
}

fn map_product_db_err(e: sqlx::Error, trace_id: Option<Uuid>) -> ApiError {
    if let Some(db) = e.as_database_error() {
        match db.code().as_deref() {
            // foreign key: the referenced category is missing
            Some("23503") => {
                return ApiError::validation("category does not exist", trace_id);
            }
            // unique: duplicate sku
            Some("23505") => {
                return ApiError::Conflict {
                    code: "duplicate_sku",
                    trace_id,
                    message: Some("a product with this sku already exists".into()),
                };
            }
            _ => {}
        }
    }
    ApiError::internal(e, trace_id)
}

/// SQL predicate equivalent of `StockStatus::evaluate` for list filtering.
/// Must mirror the rule order exactly or list filters and serialized statuses
/// drift apart.
fn status_predicate(status: StockStatus) -> &'static str {
    match status {
        StockStatus::OutOfStock => "stock_current <= 0",
        StockStatus::LowStock => "stock_current > 0 AND stock_current <= stock_minimum",
        StockStatus::Overstock => {
            "stock_current > 0 AND stock_current > stock_minimum AND stock_current >= stock_maximum"
        }
        StockStatus::InStock => {
            "stock_current > 0 AND stock_current > stock_minimum AND stock_current < stock_maximum"
        }
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Json(new_product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    ensure_write_role(&sec)?;

    validate_name(&new_product.name, sec.trace_id)?;
    let stock_current = new_product.current_stock.unwrap_or(0);
    let stock_minimum = new_product.minimum_stock.unwrap_or(DEFAULT_MINIMUM_STOCK);
    let stock_maximum = new_product.maximum_stock.unwrap_or(DEFAULT_MAXIMUM_STOCK);
    validate_stock_fields(stock_current, stock_minimum, stock_maximum, sec.trace_id)?;

    let price = Money::new(new_product.price);
    let discounted = new_product.discount_price.map(Money::new);
    validate_pricing(&price, discounted.as_ref(), sec.trace_id)?;

    let description = new_product.description.unwrap_or_default();
    let image = normalize_image_input(new_product.image).unwrap_or_else(default_product_image);
    let sql = format!(
        "INSERT INTO products (name, description, category_id, sku, price, discounted_price, \
         stock_current, stock_minimum, stock_maximum, active, image) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {PRODUCT_COLUMNS}"
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(new_product.name)
        .bind(description)
        .bind(new_product.category)
        .bind(new_product.sku)
        .bind(price)
        .bind(discounted)
        .bind(stock_current)
        .bind(stock_minimum)
        .bind(stock_maximum)
        .bind(new_product.active.unwrap_or(true))
        .bind(image)
        .fetch_one(&state.db)
        .await
        .map_err(|e| map_product_db_err(e, sec.trace_id))?;

    state.notifier.product_created(&product, &sec.actor).await;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let order = PRODUCT_FIELDS.order_clause(filter.ordering.as_deref(), sec.trace_id)?;

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"));
    if let Some(category) = filter.category {
        qb.push(" AND category_id = ").push_bind(category);
    }
    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }
    if let Some(status) = filter.status {
        qb.push(" AND ").push(status_predicate(status));
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" ORDER BY ").push(order);

    let products = qb
        .build_query_as::<Product>()
        .fetch_all(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, sec.trace_id))?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(product_id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = fetch_product(&state, product_id, sec.trace_id).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(product_id): Path<i64>,
    Json(upd): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    ensure_write_role(&sec)?;

    validate_name(&upd.name, sec.trace_id)?;
    validate_stock_fields(upd.current_stock, upd.minimum_stock, upd.maximum_stock, sec.trace_id)?;
    let price = Money::new(upd.price);
    let discounted = upd.discount_price.map(Money::new);
    validate_pricing(&price, discounted.as_ref(), sec.trace_id)?;

    let existing = fetch_product(&state, product_id, sec.trace_id).await?;

    let image = normalize_image_input(upd.image);
    let sql = format!(
        "UPDATE products SET name = $1, description = $2, category_id = $3, sku = $4, price = $5, \
         discounted_price = $6, stock_current = $7, stock_minimum = $8, stock_maximum = $9, \
         active = $10, image = COALESCE($11, image), updated_at = NOW() \
         WHERE id = $12 RETURNING {PRODUCT_COLUMNS}"
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(upd.name)
        .bind(upd.description)
        .bind(upd.category)
        .bind(upd.sku)
        .bind(price)
        .bind(discounted)
        .bind(upd.current_stock)
        .bind(upd.minimum_stock)
        .bind(upd.maximum_stock)
        .bind(upd.active)
        .bind(image)
        .bind(product_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| map_product_db_err(e, sec.trace_id))?;

    state
        .notifier
        .product_updated(&product, existing.stock_current, &sec.actor)
        .await;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ensure_write_role(&sec)?;

    let existing = fetch_product(&state, product_id, sec.trace_id).await?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, sec.trace_id))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound { code: "product_not_found", trace_id: sec.trace_id });
    }

    tracing::info!(product_id = existing.id, actor = %sec.actor.label(), "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_product(
    state: &AppState,
    product_id: i64,
    trace_id: Option<Uuid>,
) -> Result<Product, ApiError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(product_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, trace_id))?;
    product.ok_or(ApiError::NotFound { code: "product_not_found", trace_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: 42,
            name: "Ceramic mug".into(),
            description: "Stoneware, 350ml".into(),
            category_id: Some(7),
            sku: Some("MUG-350".into()),
            price: Money::new(BigDecimal::parse_bytes(b"12.50", 10).unwrap()),
            discounted_price: None,
            stock_current: 3,
            stock_minimum: 5,
            stock_maximum: 50,
            active: true,
            image: "https://cdn.example.com/mug.jpg".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn serializes_contract_names_and_derived_fields() {
        let value = serde_json::to_value(sample_product()).unwrap();
        assert_eq!(value["category"], 7);
        assert_eq!(value["current_stock"], 3);
        assert_eq!(value["minimum_stock"], 5);
        assert_eq!(value["maximum_stock"], 50);
        assert_eq!(value["stock_status"], "LOW_STOCK");
        assert_eq!(value["in_stock"], true);
        // storage names never leak onto the wire
        assert!(value.get("stock_current").is_none());
        assert!(value.get("discounted_price").is_none());
    }

    #[test]
    fn serializer_agrees_with_field_map() {
        // Every queryable contract field must also exist on the serialized
        // product, or ordering would accept names responses never show.
        let value = serde_json::to_value(sample_product()).unwrap();
        for contract in PRODUCT_FIELDS.contract_names() {
            assert!(value.get(contract).is_some(), "missing contract field {contract}");
        }
    }

    #[test]
    fn stock_validation_messages_are_descriptive() {
        let err = validate_stock_fields(-2, 5, 10, None).unwrap_err();
        match err {
            ApiError::Validation { message, .. } => assert!(message.contains("-2")),
            other => panic!("expected Validation, got {other:?}"),
        }
        let err = validate_stock_fields(3, 10, 5, None).unwrap_err();
        match err {
            ApiError::Validation { message, .. } => {
                assert!(message.contains("minimum_stock (10)"));
                assert!(message.contains("maximum_stock (5)"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(validate_stock_fields(0, 0, 0, None).is_ok());
    }

    #[test]
    fn pricing_validation_rejects_inverted_discount() {
        let price = Money::new(BigDecimal::parse_bytes(b"10.00", 10).unwrap());
        let discount = Money::new(BigDecimal::parse_bytes(b"12.00", 10).unwrap());
        assert!(validate_pricing(&price, Some(&discount), None).is_err());
        let ok_discount = Money::new(BigDecimal::parse_bytes(b"8.00", 10).unwrap());
        assert!(validate_pricing(&price, Some(&ok_discount), None).is_ok());
    }

    #[test]
    fn image_normalization_defaults_blank_input() {
        assert_eq!(normalize_image_input(None), None);
        let normalized = normalize_image_input(Some("   ".into())).unwrap();
        assert!(normalized.contains("placehold") || !normalized.is_empty());
        assert_eq!(
            normalize_image_input(Some(" https://x/y.png ".into())).as_deref(),
            Some("https://x/y.png")
        );
    }

    #[test]
    fn status_predicates_mirror_evaluator() {
        // Spot-check the SQL predicates against the pure evaluator on the
        // boundary grid used by the evaluator's own tests.
        let grid = [(0, 5, 10), (5, 5, 10), (10, 5, 10), (7, 5, 10), (5, 5, 5)];
        for (current, minimum, maximum) in grid {
            let status = StockStatus::evaluate(current, minimum, maximum);
            let predicate = status_predicate(status);
            let holds = match status {
                StockStatus::OutOfStock => current <= 0,
                StockStatus::LowStock => current > 0 && current <= minimum,
                StockStatus::Overstock => {
                    current > 0 && current > minimum && current >= maximum
                }
                StockStatus::InStock => current > 0 && current > minimum && current < maximum,
            };
            assert!(holds, "predicate {predicate:?} does not hold for {current},{minimum},{maximum}");
        }
    }
}
