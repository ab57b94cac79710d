use crate::context::SecurityContext;
use crate::SecurityError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Staff roles notifications and guards target. `Unknown` keeps the set open:
/// roles configured upstream that this service has no special handling for
/// still round-trip through alerts untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    SystemAdministrator,
    PurchasingManager,
    InventoryClerk,
    Support,
    Unknown(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::SystemAdministrator => "system_administrator",
            Role::PurchasingManager => "purchasing_manager",
            Role::InventoryClerk => "inventory_clerk",
            Role::Support => "support",
            Role::Unknown(other) => other,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "system_administrator" => Role::SystemAdministrator,
            "purchasing_manager" => Role::PurchasingManager,
            "inventory_clerk" => Role::InventoryClerk,
            "support" => Role::Support,
            other => Role::Unknown(other.to_string()),
        })
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Wire form is the bare slug, both directions.
impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slug = String::deserialize(deserializer)?;
        slug.parse().map_err(D::Error::custom)
    }
}

pub fn ensure_any_role(ctx: &SecurityContext, required: &[Role]) -> Result<(), SecurityError> {
    if ctx.roles.iter().any(|r| required.iter().any(|x| x == r)) {
        return Ok(());
    }
    warn!(actor = %ctx.actor.label(), ?required, roles = ?ctx.roles, "role_check_failed");
    Err(SecurityError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Actor;

    fn ctx(roles: Vec<Role>) -> SecurityContext {
        SecurityContext { actor: Actor::default(), roles, trace_id: None }
    }

    #[test]
    fn slug_round_trip() {
        for slug in ["system_administrator", "purchasing_manager", "inventory_clerk", "support"] {
            let role: Role = slug.parse().unwrap();
            assert_eq!(role.as_str(), slug);
        }
        let role: Role = "warehouse_lead".parse().unwrap();
        assert_eq!(role, Role::Unknown("warehouse_lead".into()));
        assert_eq!(role.as_str(), "warehouse_lead");
    }

    #[test]
    fn serde_uses_slugs() {
        let json = serde_json::to_string(&Role::PurchasingManager).unwrap();
        assert_eq!(json, "\"purchasing_manager\"");
        let back: Role = serde_json::from_str("\"warehouse_lead\"").unwrap();
        assert_eq!(back, Role::Unknown("warehouse_lead".into()));
    }

    #[test]
    fn any_role_accepts_match() {
        let c = ctx(vec![Role::InventoryClerk]);
        assert!(ensure_any_role(&c, &[Role::PurchasingManager, Role::InventoryClerk]).is_ok());
    }

    #[test]
    fn any_role_rejects_without_match() {
        let c = ctx(vec![Role::Support]);
        assert!(ensure_any_role(&c, &[Role::PurchasingManager]).is_err());
    }
}
