//! Role hierarchy
//!
//! Total order `external < pet < simplified < member < responsible < admin`,
//! used for "minimum role" checks and for deciding who may manage whom.

use ha_core::Role;

/// Numeric rank of a role, `0` (external) to `5` (admin)
pub const fn role_rank(role: Role) -> u8 {
    match role {
        Role::External => 0,
        Role::Pet => 1,
        Role::Simplified => 2,
        Role::Member => 3,
        Role::Responsible => 4,
        Role::Admin => 5,
    }
}

/// `rank(role) >= rank(min)`
pub fn has_min_role(role: Role, min: Role) -> bool {
    role_rank(role) >= role_rank(min)
}

/// Pet profiles hold health records but have no credentials
pub fn can_authenticate(role: Role) -> bool {
    role != Role::Pet
}

/// Whether `actor` may edit, reset or deactivate a member holding `target`
///
/// Admins manage everyone, including other admins. Below that, only a
/// responsible member manages, and only strictly lower roles.
pub fn can_manage(actor: Role, target: Role) -> bool {
    match actor {
        Role::Admin => true,
        Role::Responsible => role_rank(actor) > role_rank(target),
        _ => false,
    }
}

/// Whether `actor` may give a member the role `role`
pub fn can_assign(actor: Role, role: Role) -> bool {
    match actor {
        Role::Admin => true,
        Role::Responsible => role_rank(role) < role_rank(actor),
        _ => false,
    }
}
