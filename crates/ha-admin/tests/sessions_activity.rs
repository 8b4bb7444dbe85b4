//! Session administration, activity log and overview

mod common;

use assert_matches::assert_matches;
use ha_admin::SessionQuery;
use ha_core::{Action, HaError, Module, NotificationKind, Role};
use ha_store::{ActivityQuery, RevokeReason, SessionRepository};
use ha_testkit::TestHouse;

#[tokio::test]
async fn test_admin_sees_all_sessions_members_see_own() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let admin_tokens = house.login_as(Role::Admin).await;
    let actor = house.auth.authenticate(&admin_tokens.access_token).await.unwrap();
    let member = house.principal(Role::Member).await;
    house.login_as(Role::External).await;

    let all = admin
        .sessions
        .list_sessions(&actor, &SessionQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all.iter().filter(|s| s.current).count(), 1);

    let own = admin
        .sessions
        .list_sessions(&member, &SessionQuery::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].user_id, member.user_id);

    let snooping = SessionQuery {
        user: Some(actor.user_id),
        ..SessionQuery::default()
    };
    assert_matches!(
        admin.sessions.list_sessions(&member, &snooping).await,
        Err(HaError::PermissionDenied { .. })
    );
}

#[tokio::test]
async fn test_revoke_session_by_admin_and_owner() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let actor = house.principal(Role::Admin).await;
    let member = house.principal(Role::Member).await;
    let other = house.login_as(Role::Simplified).await;

    // A member cannot revoke someone else's session
    assert_matches!(
        admin.sessions.revoke_session(&member, other.session_id).await,
        Err(HaError::PermissionDenied { .. })
    );
    // The admin can, once
    assert!(admin.sessions.revoke_session(&actor, other.session_id).await.unwrap());
    assert!(!admin.sessions.revoke_session(&actor, other.session_id).await.unwrap());
    // Owners can end their own
    assert!(admin
        .sessions
        .revoke_session(&member, member.session_id)
        .await
        .unwrap());

    let record = house.store.get_session(other.session_id).await.unwrap().unwrap();
    assert!(record.is_revoked);
    assert_eq!(record.revoke_reason, Some(RevokeReason::Revoked));
    assert!(house.auth.authenticate(&other.access_token).await.is_err());

    let revoked_notices = house
        .notifier
        .sent()
        .iter()
        .filter(|n| matches!(n.kind, NotificationKind::SessionRevoked { .. }))
        .count();
    assert_eq!(revoked_notices, 2);
}

#[tokio::test]
async fn test_revoke_user_sessions() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let responsible = house.principal(Role::Responsible).await;
    house.login_as(Role::Member).await;
    house.login_as(Role::Member).await;

    let count = admin
        .sessions
        .revoke_user_sessions(&responsible, house.member_id(Role::Member))
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_matches!(
        admin
            .sessions
            .revoke_user_sessions(&responsible, house.member_id(Role::Admin))
            .await,
        Err(HaError::PermissionDenied { .. })
    );
}

#[tokio::test]
async fn test_expire_stale_soft_deletes() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let tokens = house.login_as(Role::Member).await;

    assert_eq!(admin.sessions.expire_stale(house.time.current()).await.unwrap(), 0);
    house
        .time
        .advance_secs(house.auth.config().refresh_token_ttl_secs);
    assert_eq!(admin.sessions.expire_stale(house.time.current()).await.unwrap(), 1);

    let record = house.store.get_session(tokens.session_id).await.unwrap().unwrap();
    assert_eq!(record.revoke_reason, Some(RevokeReason::Expired));
    // Kept for audit
    assert_eq!(
        admin
            .sessions
            .expire_stale(house.time.current())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_record_requires_the_recorded_permission() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let member = house.principal(Role::Member).await;

    let entry = admin
        .activity
        .record(&member, Module::Tasks, Action::Create, "Added 'water plants'")
        .await
        .unwrap();
    assert_eq!(entry.user_id, Some(member.user_id));
    assert_matches!(
        admin
            .activity
            .record(&member, Module::Finance, Action::Create, "Paid rent")
            .await,
        Err(HaError::PermissionDenied { .. })
    );
    assert_matches!(
        admin
            .activity
            .record(&member, Module::Tasks, Action::Create, "   ")
            .await,
        Err(HaError::Invalid { .. })
    );
    assert_matches!(
        house.notifier.sent().last().map(|n| &n.kind),
        Some(NotificationKind::ActivityLogged {
            module: Module::Tasks,
            action: Action::Create
        })
    );
}

#[tokio::test]
async fn test_activity_visibility_by_role() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let responsible = house.principal(Role::Responsible).await;
    let member = house.principal(Role::Member).await;
    let simplified = house.principal(Role::Simplified).await;

    admin
        .activity
        .record(&member, Module::Tasks, Action::Edit, "Done: dishes")
        .await
        .unwrap();
    admin
        .activity
        .record(&simplified, Module::Tasks, Action::Edit, "Done: homework")
        .await
        .unwrap();

    let everything = ActivityQuery::default();
    assert_eq!(
        admin.activity.list(&responsible, &everything).await.unwrap().len(),
        2
    );
    let own = admin.activity.list(&member, &everything).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].summary, "Done: dishes");

    // Query by someone else's id just yields nothing for non-managers
    let theirs = ActivityQuery {
        user: Some(simplified.user_id),
        ..ActivityQuery::default()
    };
    assert!(admin.activity.list(&member, &theirs).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activity_paging_and_window() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let actor = house.principal(Role::Admin).await;

    let start = house.time.current();
    for i in 0..5 {
        admin
            .activity
            .record(&actor, Module::Calendar, Action::Create, &format!("event {i}"))
            .await
            .unwrap();
        house.time.advance_secs(60);
    }

    let page = ActivityQuery {
        limit: Some(2),
        offset: 1,
        ..ActivityQuery::default()
    };
    let summaries: Vec<String> = admin
        .activity
        .list(&actor, &page)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.summary)
        .collect();
    assert_eq!(summaries, ["event 3", "event 2"]);

    let window = ActivityQuery {
        since: Some(start.plus(std::time::Duration::from_secs(120))),
        ..ActivityQuery::default()
    };
    assert_eq!(admin.activity.list(&actor, &window).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_activity_summary() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let actor = house.principal(Role::Admin).await;
    let member = house.principal(Role::Member).await;

    admin
        .activity
        .record(&actor, Module::Finance, Action::Create, "Budget")
        .await
        .unwrap();
    admin
        .activity
        .record(&member, Module::Tasks, Action::Create, "Chore")
        .await
        .unwrap();
    house.time.advance_secs(24 * 60 * 60);
    admin
        .activity
        .record(&member, Module::Tasks, Action::Edit, "Chore done")
        .await
        .unwrap();

    let summary = admin.activity.summary(&actor, None).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.by_module[&Module::Tasks], 2);
    assert_eq!(summary.by_user[&member.user_id], 2);
    assert_eq!(summary.by_day.len(), 2);

    let own = admin.activity.summary(&member, None).await.unwrap();
    assert_eq!(own.total, 2);

    let recent = admin
        .activity
        .summary(&actor, Some(house.time.current()))
        .await
        .unwrap();
    assert_eq!(recent.total, 1);
}

#[tokio::test]
async fn test_overview_is_admin_only() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let actor = house.principal(Role::Admin).await;
    let responsible = house.principal(Role::Responsible).await;
    house.add_pending_member("New", Role::Member).await;

    assert_matches!(
        admin.overview(&responsible).await,
        Err(HaError::PermissionDenied { .. })
    );

    let overview = admin.overview(&actor).await.unwrap();
    assert_eq!(overview.house.id, house.house_id());
    assert_eq!(overview.active_members, 7);
    assert_eq!(overview.members_by_role[&Role::Member], 2);
    assert_eq!(overview.pending_activation, 1);
    assert_eq!(overview.active_sessions, 2);
}

#[tokio::test]
async fn test_change_house_pin() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);
    let actor = house.principal(Role::Admin).await;
    let responsible = house.principal(Role::Responsible).await;

    assert_matches!(
        admin.houses.change_house_pin(&responsible, "9182").await,
        Err(HaError::PermissionDenied { .. })
    );
    admin.houses.change_house_pin(&actor, "9182").await.unwrap();

    assert!(house
        .auth
        .verify_house_pin("test-house", ha_testkit::TEST_HOUSE_PIN)
        .await
        .is_err());
    assert!(house.auth.verify_house_pin("test-house", "9182").await.is_ok());
    assert_matches!(
        house.notifier.sent().last().map(|n| &n.kind),
        Some(NotificationKind::HouseSettingsChanged)
    );
}

#[tokio::test]
async fn test_create_house_bootstraps_admin() {
    let house = TestHouse::builder().build().await;
    let admin = common::services(&house);

    let created = admin
        .houses
        .create_house("Beach House", "Beach-House", "5820", "Dana")
        .await
        .unwrap();
    assert_eq!(created.house.code, "beach-house");
    assert_eq!(created.admin.role, Role::Admin);
    assert!(created.admin.needs_activation);

    let login = house
        .auth
        .verify_house_pin("beach-house", "5820")
        .await
        .unwrap();
    assert_eq!(login.members.len(), 1);

    assert_matches!(
        admin
            .houses
            .create_house("Copy", "beach-house", "5820", "Eve")
            .await,
        Err(HaError::Conflict { .. })
    );
    assert_matches!(
        admin.houses.create_house("Bad", "b!", "5820", "Eve").await,
        Err(HaError::Invalid { .. })
    );
}
