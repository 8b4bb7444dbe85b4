//! Property tests for the permission matrix and role hierarchy

use ha_authorization::{
    can_assign, can_manage, has_min_role, has_permission, permission_map, permissions_for,
    role_rank, ActionSet,
};
use ha_core::{Action, Module, Role};
use proptest::prelude::*;

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn any_module() -> impl Strategy<Value = Module> {
    prop::sample::select(Module::ALL.to_vec())
}

fn any_action() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::ALL.to_vec())
}

proptest! {
    #[test]
    fn any_action_implies_view(role in any_role(), module in any_module()) {
        let set = permissions_for(role, module);
        if !set.is_empty() {
            prop_assert!(set.contains(Action::View));
        }
    }

    #[test]
    fn admin_dominates_every_role(role in any_role(), module in any_module()) {
        prop_assert!(
            permissions_for(Role::Admin, module).is_superset_of(permissions_for(role, module))
        );
    }

    #[test]
    fn min_role_matches_rank_order(a in any_role(), b in any_role()) {
        prop_assert_eq!(has_min_role(a, b), role_rank(a) >= role_rank(b));
        prop_assert_eq!(has_min_role(a, b), a >= b);
    }

    #[test]
    fn hierarchy_is_total(a in any_role(), b in any_role()) {
        prop_assert!(has_min_role(a, b) || has_min_role(b, a));
    }

    #[test]
    fn non_admins_never_manage_upward(actor in any_role(), target in any_role()) {
        if actor != Role::Admin && can_manage(actor, target) {
            prop_assert!(role_rank(actor) > role_rank(target));
        }
    }

    #[test]
    fn assignment_never_escalates(actor in any_role(), role in any_role()) {
        if actor != Role::Admin && can_assign(actor, role) {
            prop_assert!(role_rank(role) < role_rank(actor));
        }
    }

    #[test]
    fn map_agrees_with_lookup(role in any_role(), module in any_module(), action in any_action()) {
        let listed = permission_map(role)
            .get(&module)
            .map(|actions| actions.contains(&action))
            .unwrap_or(false);
        prop_assert_eq!(listed, has_permission(role, module, action));
    }
}

#[test]
fn responsible_row_matches_table() {
    let tasks: ActionSet = Action::ALL.into_iter().collect();
    assert_eq!(permissions_for(Role::Responsible, Module::Tasks), tasks);
    assert!(!has_permission(Role::Responsible, Module::Finance, Action::Manage));
    assert!(has_permission(Role::Responsible, Module::Users, Action::Edit));
    assert!(!has_permission(Role::Responsible, Module::Users, Action::Delete));
    assert!(!has_permission(Role::Responsible, Module::Admin, Action::View));
}

/// Every cell of the matrix, one row per module
///
/// Columns follow `ROLES`; letters are View, Create, Edit, Delete, Manage and
/// `-` is no access.
const MATRIX: [(Module, [&str; 6]); 10] = [
    (Module::Dashboard, ["VCEDM", "V", "V", "V", "V", "-"]),
    (Module::Tasks, ["VCEDM", "VCEDM", "VCE", "VE", "V", "-"]),
    (Module::Finance, ["VCEDM", "VCED", "V", "-", "-", "-"]),
    (Module::Calendar, ["VCEDM", "VCED", "VCE", "V", "V", "-"]),
    (Module::Health, ["VCEDM", "VCED", "VCE", "V", "-", "-"]),
    (Module::Security, ["VCEDM", "VCE", "V", "-", "-", "-"]),
    (Module::Users, ["VCEDM", "VCE", "V", "-", "-", "-"]),
    (Module::Activity, ["VCEDM", "V", "-", "-", "-", "-"]),
    (Module::Settings, ["VCEDM", "V", "V", "-", "-", "-"]),
    (Module::Admin, ["VCEDM", "-", "-", "-", "-", "-"]),
];

const ROLES: [Role; 6] = [
    Role::Admin,
    Role::Responsible,
    Role::Member,
    Role::Simplified,
    Role::External,
    Role::Pet,
];

fn letter(action: Action) -> char {
    match action {
        Action::View => 'V',
        Action::Create => 'C',
        Action::Edit => 'E',
        Action::Delete => 'D',
        Action::Manage => 'M',
    }
}

#[test]
fn every_cell_matches_table() {
    let mut cells = 0;
    for (module, row) in MATRIX {
        for (role, expected) in ROLES.into_iter().zip(row) {
            for action in Action::ALL {
                assert_eq!(
                    has_permission(role, module, action),
                    expected.contains(letter(action)),
                    "{role:?} {action:?} on {module:?}"
                );
            }
            cells += 1;
        }
    }
    assert_eq!(cells, Role::ALL.len() * Module::ALL.len());
}

#[test]
fn table_covers_every_module() {
    let listed: Vec<Module> = MATRIX.iter().map(|(module, _)| *module).collect();
    assert_eq!(listed, Module::ALL.to_vec());
}
