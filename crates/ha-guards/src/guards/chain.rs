//! Composable guards
//!
//! ```text
//! HouseGuard → RoleGuard → PermissionGuard → handler
//! ```
//!
//! A [`GuardChain`] evaluates its guards in insertion order and stops at the
//! first denial.

use super::types::{GuardDecision, GuardViolation};
use ha_authorization::{has_min_role, has_permission};
use ha_core::{Action, HouseId, Module, Principal, Role};

/// A single check against an authenticated principal
pub trait Guard: Send + Sync {
    /// Evaluate the guard
    fn check(&self, principal: &Principal) -> GuardDecision;
}

/// Requires a minimum role in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGuard {
    pub min_role: Role,
}

impl RoleGuard {
    pub fn new(min_role: Role) -> Self {
        Self { min_role }
    }
}

impl Guard for RoleGuard {
    fn check(&self, principal: &Principal) -> GuardDecision {
        if has_min_role(principal.role, self.min_role) {
            GuardDecision::allow()
        } else {
            GuardDecision::deny(GuardViolation::InsufficientRole {
                required: self.min_role,
                actual: principal.role,
            })
        }
    }
}

/// Requires one cell of the permission matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGuard {
    pub module: Module,
    pub action: Action,
}

impl PermissionGuard {
    pub fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }
}

impl Guard for PermissionGuard {
    fn check(&self, principal: &Principal) -> GuardDecision {
        if has_permission(principal.role, self.module, self.action) {
            GuardDecision::allow()
        } else {
            GuardDecision::deny(GuardViolation::MissingPermission {
                module: self.module,
                action: self.action,
            })
        }
    }
}

/// Requires the principal to belong to a specific house
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseGuard {
    pub house_id: HouseId,
}

impl HouseGuard {
    pub fn new(house_id: HouseId) -> Self {
        Self { house_id }
    }
}

impl Guard for HouseGuard {
    fn check(&self, principal: &Principal) -> GuardDecision {
        if principal.house_id == self.house_id {
            GuardDecision::allow()
        } else {
            GuardDecision::deny(GuardViolation::CrossHouse {
                house_id: self.house_id,
            })
        }
    }
}

/// Ordered guards, first denial wins
#[derive(Default)]
pub struct GuardChain {
    guards: Vec<Box<dyn Guard>>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guard
    pub fn with(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Append a role guard
    pub fn min_role(self, role: Role) -> Self {
        self.with(RoleGuard::new(role))
    }

    /// Append a permission guard
    pub fn permission(self, module: Module, action: Action) -> Self {
        self.with(PermissionGuard::new(module, action))
    }

    /// Append a house guard
    pub fn house(self, house_id: HouseId) -> Self {
        self.with(HouseGuard::new(house_id))
    }

    /// Number of guards in the chain
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether the chain has no guards
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Evaluate against an optional principal; `None` is always denied
    pub fn evaluate(&self, principal: Option<&Principal>) -> GuardDecision {
        let Some(principal) = principal else {
            return GuardDecision::deny(GuardViolation::Unauthenticated);
        };
        for guard in &self.guards {
            let decision = guard.check(principal);
            if let Some(reason) = decision.denial_reason() {
                tracing::debug!(
                    user_id = %principal.user_id,
                    role = %principal.role,
                    %reason,
                    "guard chain denied"
                );
                return decision;
            }
        }
        GuardDecision::allow()
    }
}

impl std::fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardChain")
            .field("guards", &self.guards.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::{SessionId, UserId};

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), HouseId::new(), role, SessionId::new())
    }

    #[test]
    fn test_first_denial_wins() {
        let p = principal(Role::Simplified);
        let chain = GuardChain::new()
            .house(HouseId::new())
            .min_role(Role::Admin);
        assert!(matches!(
            chain.evaluate(Some(&p)).denial_reason(),
            Some(GuardViolation::CrossHouse { .. })
        ));
    }

    #[test]
    fn test_role_then_permission() {
        let p = principal(Role::Member);
        let chain = GuardChain::new()
            .house(p.house_id)
            .min_role(Role::Member)
            .permission(Module::Finance, Action::Create);
        assert_eq!(
            chain.evaluate(Some(&p)),
            GuardDecision::deny(GuardViolation::MissingPermission {
                module: Module::Finance,
                action: Action::Create,
            })
        );

        let admin = Principal {
            role: Role::Admin,
            ..p
        };
        assert!(chain.evaluate(Some(&admin)).is_allowed());
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        let chain = GuardChain::new();
        assert!(chain.is_empty());
        assert_eq!(
            chain.evaluate(None),
            GuardDecision::deny(GuardViolation::Unauthenticated)
        );
    }
}
