//! UI render gates
//!
//! Snapshot of one role's matrix row handed to the frontend so widgets can
//! decide whether to render without another round trip.

use ha_authorization::{accessible_modules, has_permission, permission_map, role_rank};
use ha_core::{Action, Module, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-role render gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiGate {
    pub role: Role,
    pub rank: u8,
    pub permissions: BTreeMap<Module, Vec<Action>>,
}

impl UiGate {
    pub fn for_role(role: Role) -> Self {
        Self {
            role,
            rank: role_rank(role),
            permissions: permission_map(role),
        }
    }

    /// Whether a control performing `action` on `module` should render
    pub fn can(&self, module: Module, action: Action) -> bool {
        has_permission(self.role, module, action)
    }

    /// Menu entries
    pub fn visible_modules(&self) -> Vec<Module> {
        accessible_modules(self.role)
    }
}
