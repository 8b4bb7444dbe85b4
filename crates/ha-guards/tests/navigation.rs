//! End-to-end navigation checks over the standard route table

use ha_core::{HouseId, Principal, Role, SessionId, UserId};
use ha_guards::{GuardViolation, RouteDecision, RouteTable, UiGate};

fn principal(role: Role) -> Principal {
    Principal::new(UserId::new(), HouseId::new(), role, SessionId::new())
}

#[test]
fn every_visible_route_is_navigable() {
    let table = RouteTable::standard();
    for role in Role::ALL {
        let p = principal(role);
        for route in table.visible_routes(role) {
            assert_eq!(
                table.navigate(Some(&p), &route.path),
                RouteDecision::Allow,
                "{role} should reach {}",
                route.path
            );
        }
    }
}

#[test]
fn simplified_member_is_kept_out_of_finance() {
    let table = RouteTable::standard();
    let decision = table.navigate(Some(&principal(Role::Simplified)), "/finance/budgets");
    match decision {
        RouteDecision::Forbidden {
            reason: GuardViolation::MissingPermission { module, .. },
        } => assert_eq!(module.as_str(), "finance"),
        other => panic!("unexpected decision: {other:?}"),
    }
}

#[test]
fn menu_and_routes_agree_for_admin() {
    let table = RouteTable::standard();
    let paths: Vec<String> = table
        .visible_routes(Role::Admin)
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert!(paths.contains(&"/admin".to_string()));
    assert_eq!(UiGate::for_role(Role::Admin).visible_modules().len(), 10);
}

#[test]
fn pet_only_sees_authenticated_shell_routes() {
    let table = RouteTable::standard();
    let paths: Vec<String> = table
        .visible_routes(Role::Pet)
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(paths, vec!["/".to_string(), "/profile".to_string()]);
}
