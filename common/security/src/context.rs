use crate::actor::{actor_from_headers, Actor};
use crate::roles::Role;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

/// Per-request security context assembled from gateway-verified headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    pub actor: Actor,
    pub roles: Vec<Role>,
    pub trace_id: Option<Uuid>,
}

pub struct SecurityCtxExtractor(pub SecurityContext);

fn roles_from_headers(headers: &HeaderMap) -> Vec<Role> {
    headers
        .get("X-Roles")
        .and_then(|v| v.to_str().ok())
        .map(|csv| {
            csv.split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse::<Role>().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn trace_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("X-Trace-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for SecurityCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let actor = actor_from_headers(headers);
        if actor.id.is_none() {
            return Err(ApiError::BadRequest {
                code: "missing_user_header",
                trace_id: None,
                message: Some("Missing or malformed X-User-ID header".into()),
            });
        }

        let roles = roles_from_headers(headers);
        let trace_id = trace_id_from_headers(headers).or_else(|| Some(Uuid::new_v4()));

        if let Some(tid) = trace_id.as_ref() {
            Span::current().record("trace_id", tracing::field::display(tid));
        }

        Ok(SecurityCtxExtractor(SecurityContext { actor, roles, trace_id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_roles_csv() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Roles",
            HeaderValue::from_static("purchasing_manager, inventory_clerk,, warehouse_lead"),
        );
        let roles = roles_from_headers(&headers);
        assert_eq!(
            roles,
            vec![
                Role::PurchasingManager,
                Role::InventoryClerk,
                Role::Unknown("warehouse_lead".into())
            ]
        );
    }

    #[test]
    fn missing_roles_header_means_no_roles() {
        assert!(roles_from_headers(&HeaderMap::new()).is_empty());
    }
}
