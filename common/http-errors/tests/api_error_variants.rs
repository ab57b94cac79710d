use axum::http::StatusCode;
use axum::response::IntoResponse;
use common_http_errors::ApiError;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn validation_carries_descriptive_message() {
    let trace = Uuid::new_v4();
    let resp = ApiError::validation("current_stock must be non-negative, got -2", Some(trace))
        .into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get("X-Error-Code").unwrap(),
        "validation_failed"
    );
    let body = body_json(resp).await;
    assert_eq!(body["code"], "validation_failed");
    assert_eq!(body["trace_id"], trace.to_string());
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("must be non-negative"));
}

#[tokio::test]
async fn missing_role_names_the_role() {
    let resp = ApiError::ForbiddenMissingRole { role: "purchasing_manager", trace_id: None }
        .into_response();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "missing_role");
    let body = body_json(resp).await;
    assert_eq!(body["missing_role"], "purchasing_manager");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn not_found_uses_stable_code() {
    let resp = ApiError::NotFound { code: "product_not_found", trace_id: None }.into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get("X-Error-Code").unwrap(),
        "product_not_found"
    );
    let body = body_json(resp).await;
    assert_eq!(body["code"], "product_not_found");
}

#[tokio::test]
async fn conflict_surfaces_reason() {
    let resp = ApiError::Conflict {
        code: "category_in_use",
        trace_id: None,
        message: Some("category still has products assigned".into()),
    }
    .into_response();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "category_in_use");
    assert_eq!(body["message"], "category still has products assigned");
}

#[tokio::test]
async fn internal_maps_display_error() {
    let resp = ApiError::internal("connection refused", None).into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.headers().get("X-Error-Code").unwrap(),
        "internal_error"
    );
    let body = body_json(resp).await;
    assert_eq!(body["message"], "connection refused");
}
