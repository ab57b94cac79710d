use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The acting user a mutation is attributed to. Identity is verified by the
/// gateway; by the time a request reaches a service the user is a set of
/// trusted `X-User-*` headers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Actor {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Actor {
    /// Best display label for log lines and notification attribution.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .or_else(|| self.id.map(|id| id.to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn header_str(map: &HeaderMap, name: &str) -> Option<String> {
    map.get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn actor_from_headers(headers: &HeaderMap) -> Actor {
    Actor {
        id: header_str(headers, "X-User-ID").and_then(|s| Uuid::parse_str(&s).ok()),
        name: header_str(headers, "X-User-Name"),
        email: header_str(headers, "X-User-Email"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_from_headers() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert("X-User-ID", HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert("X-User-Name", HeaderValue::from_static("Dana"));
        headers.insert("X-User-Email", HeaderValue::from_static("dana@example.com"));
        let actor = actor_from_headers(&headers);
        assert_eq!(actor.id, Some(id));
        assert_eq!(actor.label(), "Dana");
    }

    #[test]
    fn blank_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("X-User-Name", HeaderValue::from_static("   "));
        let actor = actor_from_headers(&headers);
        assert_eq!(actor.name, None);
        assert_eq!(actor.label(), "unknown");
    }
}
