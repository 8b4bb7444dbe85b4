//! Query scopes
//!
//! Backend queries never run unfiltered. A [`ScopeFilter`] pins every query to
//! the caller's house and, for limited roles, to records the caller owns or was
//! assigned.

use crate::hierarchy::has_min_role;
use crate::matrix::require_permission;
use ha_core::{Action, HouseId, Module, Principal, Result, Role, UserId};
use serde::{Deserialize, Serialize};

/// How much of a house's data a role sees in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataScope {
    /// Every record in the house
    House,
    /// Only records owned by or assigned to the caller
    Own,
}

/// Scope for `role` in `module`
///
/// Members and above see house-wide data in modules they can view. Simplified
/// and external members only see their own. The activity log is house-wide for
/// responsible members and above only.
pub fn data_scope(role: Role, module: Module) -> DataScope {
    let min = match module {
        Module::Activity => Role::Responsible,
        _ => Role::Member,
    };
    if has_min_role(role, min) {
        DataScope::House
    } else {
        DataScope::Own
    }
}

/// A record that belongs to a house and optionally to an owner
pub trait Scoped {
    /// Owning house
    fn house_id(&self) -> HouseId;

    /// Members the record belongs to or is assigned to
    fn owners(&self) -> Vec<UserId>;
}

/// House and owner restriction for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFilter {
    /// Only records of this house
    pub house_id: HouseId,
    /// When set, only records owned by or assigned to this member
    pub owner: Option<UserId>,
}

impl ScopeFilter {
    /// Filter for `principal` reading `module`
    ///
    /// Fails with `PermissionDenied` when the role cannot view the module.
    pub fn for_principal(principal: &Principal, module: Module) -> Result<Self> {
        require_permission(principal.role, module, Action::View)?;
        let owner = match data_scope(principal.role, module) {
            DataScope::House => None,
            DataScope::Own => Some(principal.user_id),
        };
        Ok(Self {
            house_id: principal.house_id,
            owner,
        })
    }

    /// House-wide filter, for system tasks that run without a principal
    pub fn house(house_id: HouseId) -> Self {
        Self {
            house_id,
            owner: None,
        }
    }

    /// Whether the filter is restricted to one member
    pub fn is_own_only(&self) -> bool {
        self.owner.is_some()
    }

    /// Whether a record passes the filter
    pub fn matches<R: Scoped + ?Sized>(&self, record: &R) -> bool {
        if record.house_id() != self.house_id {
            return false;
        }
        match self.owner {
            None => true,
            Some(owner) => record.owners().contains(&owner),
        }
    }

    /// Keep only matching records
    pub fn apply<R: Scoped>(&self, records: Vec<R>) -> Vec<R> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
