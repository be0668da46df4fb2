//! Roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role held by the founder; required for every administrative action.
pub const ADMIN: &str = "admin";

/// Role granted to every admitted member.
pub const MEMBER: &str = "member";

/// Named permission flags attached to a role.
pub type PermissionsMap = BTreeMap<String, bool>;

/// A named role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role_name: String,
    #[serde(default)]
    pub permissions: PermissionsMap,
}

impl Role {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            permissions: PermissionsMap::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionsMap) -> Self {
        self.permissions = permissions;
        self
    }

    /// Whether `permission` is set on this role.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.get(permission).copied().unwrap_or(false)
    }
}
