use assert_matches::assert_matches;
use ha_core::{
    HouseId, Notification, NotificationKind, NotificationSink, Principal, Role, SessionId,
    Timestamp, UserId,
};
use ha_realtime::{NotificationHub, ServerMessage, SocketSession};
use std::sync::Arc;
use std::time::Duration;

fn member(house_id: HouseId) -> Principal {
    Principal::new(UserId::new(), house_id, Role::Member, SessionId::new())
}

fn settings_changed(house_id: HouseId) -> Notification {
    Notification::new(
        house_id,
        None,
        NotificationKind::HouseSettingsChanged,
        "House PIN changed",
        Timestamp::from_secs(1_704_067_200),
    )
}

#[tokio::test]
async fn joined_socket_receives_house_notifications() {
    let hub = Arc::new(NotificationHub::default());
    let house = HouseId::new();
    let mut session = SocketSession::new(hub.clone(), member(house));

    let reply = session.handle_text(&format!(
        r#"{{"type":"join_house","houseId":"{}"}}"#,
        house.uuid()
    ));
    assert_eq!(reply, ServerMessage::Joined { house_id: house });

    hub.notify(settings_changed(house)).await;
    let received = session.next_notification().await.unwrap();
    assert_eq!(received.kind, NotificationKind::HouseSettingsChanged);
}

#[tokio::test]
async fn socket_cannot_join_another_house() {
    let hub = Arc::new(NotificationHub::default());
    let mut session = SocketSession::new(hub.clone(), member(HouseId::new()));
    let foreign = HouseId::new();

    let reply = session.handle(ha_realtime::ClientMessage::JoinHouse { house_id: foreign });
    assert_matches!(reply, ServerMessage::Error { ref code, .. } if code == "permission_denied");
    assert!(!session.is_joined());

    hub.notify(settings_changed(foreign)).await;
    let waited = tokio::time::timeout(Duration::from_millis(20), session.next_notification()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn leaving_and_dropping_clean_up_rooms() {
    let hub = Arc::new(NotificationHub::default());
    let house = HouseId::new();
    let mut session = SocketSession::new(hub.clone(), member(house));

    assert_matches!(
        session.handle_text(r#"{"type":"leave_house"}"#),
        ServerMessage::Error { .. }
    );
    session.handle(ha_realtime::ClientMessage::JoinHouse { house_id: house });
    assert_eq!(hub.subscriber_count(house), 1);
    assert_eq!(
        session.handle_text(r#"{"type":"leave_house"}"#),
        ServerMessage::Left { house_id: house }
    );
    assert_eq!(hub.room_count(), 0);

    session.handle(ha_realtime::ClientMessage::JoinHouse { house_id: house });
    drop(session);
    assert_eq!(hub.room_count(), 0);
}

#[tokio::test]
async fn ping_and_garbage() {
    let hub = Arc::new(NotificationHub::default());
    let mut session = SocketSession::new(hub, member(HouseId::new()));
    assert_eq!(session.handle_text(r#"{"type":"ping"}"#), ServerMessage::Pong);
    assert_matches!(
        session.handle_text("{"),
        ServerMessage::Error { ref code, .. } if code == "invalid"
    );
}
