use crate::app_state::AppState;
use crate::product_handlers::ensure_write_role;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use common_http_errors::ApiError;
use common_security::SecurityCtxExtractor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "id, name, description, active, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateCategory {
    pub name: String,
    pub description: String,
    pub active: bool,
}

fn validate_category_name(name: &str, trace_id: Option<Uuid>) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty", trace_id));
    }
    Ok(())
}

fn map_category_db_err(e: sqlx::Error, trace_id: Option<Uuid>) -> ApiError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            return ApiError::Conflict {
                code: "category_exists",
                trace_id,
                message: Some("a category with this name already exists".into()),
            };
        }
    }
    ApiError::internal(e, trace_id)
}

pub async fn create_category(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Json(new_category): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    ensure_write_role(&sec)?;
    validate_category_name(&new_category.name, sec.trace_id)?;

    let sql = format!(
        "INSERT INTO categories (name, description, active) VALUES ($1, $2, $3) \
         RETURNING {CATEGORY_COLUMNS}"
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(new_category.name)
        .bind(new_category.description.unwrap_or_default())
        .bind(new_category.active.unwrap_or(true))
        .fetch_one(&state.db)
        .await
        .map_err(|e| map_category_db_err(e, sec.trace_id))?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
) -> Result<Json<Vec<Category>>, ApiError> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name");
    let categories = sqlx::query_as::<_, Category>(&sql)
        .fetch_all(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, sec.trace_id))?;

    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(category_id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    let category = fetch_category(&state, category_id, sec.trace_id).await?;
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(category_id): Path<i64>,
    Json(upd): Json<UpdateCategory>,
) -> Result<Json<Category>, ApiError> {
    ensure_write_role(&sec)?;
    validate_category_name(&upd.name, sec.trace_id)?;

    fetch_category(&state, category_id, sec.trace_id).await?;

    let sql = format!(
        "UPDATE categories SET name = $1, description = $2, active = $3, updated_at = NOW() \
         WHERE id = $4 RETURNING {CATEGORY_COLUMNS}"
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(upd.name)
        .bind(upd.description)
        .bind(upd.active)
        .bind(category_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| map_category_db_err(e, sec.trace_id))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ensure_write_role(&sec)?;

    fetch_category(&state, category_id, sec.trace_id).await?;

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if let Some(db) = e.as_database_error() {
                // foreign key restrict: products still point here
                if db.code().as_deref() == Some("23503") {
                    return ApiError::Conflict {
                        code: "category_in_use",
                        trace_id: sec.trace_id,
                        message: Some("category still has products assigned".into()),
                    };
                }
            }
            ApiError::internal(e, sec.trace_id)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound { code: "category_not_found", trace_id: sec.trace_id });
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_category(
    state: &AppState,
    category_id: i64,
    trace_id: Option<Uuid>,
) -> Result<Category, ApiError> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(category_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(e, trace_id))?;
    category.ok_or(ApiError::NotFound { code: "category_not_found", trace_id })
}
