use chrono::{DateTime, Utc};
use common_security::{Actor, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const ALERT_SCHEMA_VERSION: i32 = 1;

/// What kind of event an alert announces. Drives default icon/color and the
/// role routing looked up by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTag {
    ProductAdded,
    ProductUpdated,
    LowStock,
    OutOfStock,
}

impl AlertTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertTag::ProductAdded => "product_added",
            AlertTag::ProductUpdated => "product_updated",
            AlertTag::LowStock => "low_stock",
            AlertTag::OutOfStock => "out_of_stock",
        }
    }

    pub fn default_icon(&self) -> &'static str {
        match self {
            AlertTag::ProductAdded => "package-plus",
            AlertTag::ProductUpdated => "pencil",
            AlertTag::LowStock => "alert-triangle",
            AlertTag::OutOfStock => "package-x",
        }
    }

    pub fn default_color(&self) -> AlertColor {
        match self {
            AlertTag::ProductAdded | AlertTag::ProductUpdated => AlertColor::Info,
            AlertTag::LowStock => AlertColor::Warning,
            AlertTag::OutOfStock => AlertColor::Danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertColor {
    Info,
    Success,
    Warning,
    Danger,
}

/// A role-targeted message. The notification service fans this out to every
/// user holding any of `roles`; this crate only defines the wire shape and
/// hands it to a sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: Uuid,
    pub schema_version: i32,
    #[serde(rename = "category_tag")]
    pub tag: AlertTag,
    pub title: String,
    pub message: String,
    pub icon: String,
    pub color: AlertColor,
    pub action_url: String,
    pub metadata: serde_json::Value,
    pub sender: Actor,
    pub roles: Vec<Role>,
    pub sent_at: DateTime<Utc>,
}

impl Alert {
    /// Build an alert with tag-derived icon/color and empty metadata.
    pub fn new(
        tag: AlertTag,
        title: impl Into<String>,
        message: impl Into<String>,
        sender: Actor,
        roles: Vec<Role>,
    ) -> Self {
        Alert {
            alert_id: Uuid::new_v4(),
            schema_version: ALERT_SCHEMA_VERSION,
            tag,
            title: title.into(),
            message: message.into(),
            icon: tag.default_icon().to_string(),
            color: tag.default_color(),
            action_url: String::new(),
            metadata: serde_json::Value::Null,
            sender,
            roles,
            sent_at: Utc::now(),
        }
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = url.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("alert sink not configured")]
    NotConfigured,
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("transport error: {0}")]
    Transport(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common_security::Role;

    #[test]
    fn new_alert_fills_tag_defaults() {
        let alert = Alert::new(
            AlertTag::LowStock,
            "Low stock",
            "\"Ceramic mug\" is down to 3 units (minimum 5).",
            Actor::default(),
            vec![Role::PurchasingManager],
        );
        assert_eq!(alert.schema_version, ALERT_SCHEMA_VERSION);
        assert_eq!(alert.icon, "alert-triangle");
        assert_eq!(alert.color, AlertColor::Warning);
        assert!(alert.action_url.is_empty());
    }

    #[test]
    fn wire_shape_carries_contract_fields() {
        let alert = Alert::new(
            AlertTag::OutOfStock,
            "Out of stock",
            "\"Ceramic mug\" is out of stock.",
            Actor { id: None, name: Some("Dana".into()), email: None },
            vec![Role::PurchasingManager, Role::SystemAdministrator],
        )
        .with_action_url("/inventory/products/42")
        .with_metadata(serde_json::json!({"product_id": 42, "current_stock": 0}));

        let value = serde_json::to_value(&alert).unwrap();
        for key in [
            "message", "title", "category_tag", "icon", "color", "action_url", "metadata",
            "sender", "roles",
        ] {
            assert!(value.get(key).is_some(), "missing field {key}");
        }
        assert_eq!(value["category_tag"], "out_of_stock");
        assert_eq!(value["color"], "danger");
        assert_eq!(value["roles"][0], "purchasing_manager");
        assert_eq!(value["metadata"]["current_stock"], 0);
    }
}
