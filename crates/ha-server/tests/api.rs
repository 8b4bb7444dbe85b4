use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use ha_core::Role;
use ha_server::{bootstrap_houses, build_router, config::BootstrapHouse, AppState};
use ha_testkit::{test_auth_config, TestHouse, TEST_HOUSE_PIN};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    house: TestHouse,
    state: AppState,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let house = TestHouse::builder().build().await;
        let state = AppState::new(
            house.store_dyn(),
            Arc::new(house.time.clone()),
            Arc::new(house.random.clone()),
            test_auth_config(),
        )
        .unwrap();
        let router = build_router(state.clone());
        Self {
            house,
            state,
            router,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, value)
    }

    async fn token(&self, role: Role) -> String {
        self.house.login_as(role).await.access_token
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, _, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn house_pin_member_pin_then_me() {
    let app = TestApp::new().await;
    let (status, _, login) = app
        .call(
            Method::POST,
            "/api/auth/house",
            None,
            Some(json!({ "code": app.house.house.code, "pin": TEST_HOUSE_PIN })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["members"].as_array().unwrap().len(), 5);
    let house_token = login["houseToken"].as_str().unwrap().to_string();

    let (status, _, outcome) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({
                "houseToken": house_token,
                "userId": app.house.member_id(Role::Member),
                "pin": TestHouse::pin_for(Role::Member).unwrap(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "session");
    let access = outcome["accessToken"].as_str().unwrap();

    let (status, _, me) = app.call(Method::GET, "/api/me", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "member");
    assert_eq!(me["capabilities"]["role"], "member");
    assert!(me["routes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["path"] != "/admin"));
}

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let app = TestApp::new().await;
    let (status, headers, body) = app.call(Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body["error"], "unauthorized");

    let (status, _, _) = app
        .call(Method::GET, "/api/me", Some("not.a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn repeated_wrong_house_pin_locks_with_retry_after() {
    let app = TestApp::new().await;
    let body = json!({ "code": app.house.house.code, "pin": "0000" });
    for _ in 0..4 {
        let (status, _, _) = app
            .call(Method::POST, "/api/auth/house", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, headers, body) = app
        .call(Method::POST, "/api/auth/house", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "locked");
    assert!(headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn refresh_rotates_and_reuse_is_rejected() {
    let app = TestApp::new().await;
    let tokens = app.house.login_as(Role::Member).await;

    let (status, _, rotated) = app
        .call(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": tokens.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], json!(tokens.refresh_token));

    let (status, _, _) = app
        .call(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": tokens.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reuse revoked the whole session, rotated pair included
    let access = rotated["accessToken"].as_str().unwrap();
    let (status, _, _) = app.call(Method::GET, "/api/me", Some(access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let access = app.token(Role::Responsible).await;
    let (status, _, _) = app
        .call(Method::POST, "/api/auth/logout", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = app.call(Method::GET, "/api/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

async fn socket_handshake(app: &TestApp, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_VERSION, "13")
        .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn socket_handshake_requires_a_live_session() {
    let app = TestApp::new().await;
    assert_eq!(socket_handshake(&app, "/ws").await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        socket_handshake(&app, "/ws?token=not.a-token").await,
        StatusCode::UNAUTHORIZED
    );

    // A live token gets past authentication; the in-process request has no
    // connection to upgrade, so the upgrade itself is refused
    let access = app.token(Role::Member).await;
    let status = socket_handshake(&app, &format!("/ws?token={access}")).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);
    assert!(status.is_client_error());

    let (status, _, _) = app
        .call(Method::POST, "/api/auth/logout", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        socket_handshake(&app, &format!("/ws?token={access}")).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn overview_is_admin_only() {
    let app = TestApp::new().await;
    let member = app.token(Role::Member).await;
    let (status, _, body) = app
        .call(Method::GET, "/api/admin/overview", Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let admin = app.token(Role::Admin).await;
    let (status, _, body) = app
        .call(Method::GET, "/api/admin/overview", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activeMembers"], 6);
    assert!(body["activeSessions"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn member_administration_respects_hierarchy() {
    let app = TestApp::new().await;
    let admin = app.token(Role::Admin).await;
    let (status, _, created) = app
        .call(
            Method::POST,
            "/api/members",
            Some(&admin),
            Some(json!({ "displayName": "Kai", "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["member"]["needsActivation"], true);
    assert!(created["temporaryPin"]["pin"].is_string());

    let responsible = app.token(Role::Responsible).await;
    let (status, _, _) = app
        .call(
            Method::POST,
            "/api/members",
            Some(&responsible),
            Some(json!({ "displayName": "Boss", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, members) = app
        .call(Method::GET, "/api/members", Some(&responsible), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 7);

    let member_id = app.house.member_id(Role::Member);
    let (status, _, view) = app
        .call(
            Method::PUT,
            &format!("/api/members/{member_id}/role"),
            Some(&admin),
            Some(json!({ "role": "simplified" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["role"], "simplified");

    let (status, _, _) = app
        .call(Method::DELETE, "/api/members/not-an-id", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sessions_are_listed_and_revoked() {
    let app = TestApp::new().await;
    let member = app.token(Role::Member).await;
    let (status, _, sessions) = app
        .call(Method::GET, "/api/sessions", Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap().clone();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["current"], true);
    assert!(sessions[0].get("refreshToken").is_none());

    let admin = app.token(Role::Admin).await;
    let session_id = sessions[0]["id"].as_str().unwrap();
    let (status, _, body) = app
        .call(
            Method::DELETE,
            &format!("/api/sessions/{session_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _, _) = app.call(Method::GET, "/api/me", Some(&member), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn activity_is_recorded_and_filtered() {
    let app = TestApp::new().await;
    let member = app.token(Role::Member).await;
    let (status, _, _) = app
        .call(
            Method::POST,
            "/api/activity",
            Some(&member),
            Some(json!({ "module": "tasks", "action": "create", "summary": "Took out the trash" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, _) = app
        .call(
            Method::POST,
            "/api/activity",
            Some(&member),
            Some(json!({ "module": "finance", "action": "create", "summary": "Paid rent" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token(Role::Admin).await;
    let (status, _, entries) = app
        .call(Method::GET, "/api/activity?module=tasks", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["summary"], "Took out the trash");

    let (status, _, _) = app
        .call(Method::GET, "/api/activity?module=garden", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, summary) = app
        .call(Method::GET, "/api/activity/summary", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["byModule"]["tasks"], 1);
}

#[tokio::test]
async fn navigation_decisions() {
    let app = TestApp::new().await;
    let (_, _, anonymous) = app
        .call(Method::POST, "/api/navigate", None, Some(json!({ "path": "/admin" })))
        .await;
    assert_eq!(anonymous["decision"], "redirect_to_login");

    let member = app.token(Role::Member).await;
    let (_, _, forbidden) = app
        .call(
            Method::POST,
            "/api/navigate",
            Some(&member),
            Some(json!({ "path": "/admin/users" })),
        )
        .await;
    assert_eq!(forbidden["decision"], "forbidden");

    let (_, _, allowed) = app
        .call(
            Method::POST,
            "/api/navigate",
            Some(&member),
            Some(json!({ "path": "/profile" })),
        )
        .await;
    assert_eq!(allowed["decision"], "allow");
}

#[tokio::test]
async fn house_pin_change_is_admin_only_and_takes_effect() {
    let app = TestApp::new().await;
    let responsible = app.token(Role::Responsible).await;
    let (status, _, _) = app
        .call(
            Method::PUT,
            "/api/house/pin",
            Some(&responsible),
            Some(json!({ "pin": "7391" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token(Role::Admin).await;
    let (status, _, _) = app
        .call(Method::PUT, "/api/house/pin", Some(&admin), Some(json!({ "pin": "7391" })))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app
        .call(
            Method::POST,
            "/api/auth/house",
            None,
            Some(json!({ "code": app.house.house.code, "pin": "7391" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bootstrap_creates_each_house_once() {
    let app = TestApp::new().await;
    let houses = vec![BootstrapHouse {
        name: "Casa Lima".into(),
        code: "Casa-Lima".into(),
        pin: "4826".into(),
        admin_name: "Ana".into(),
    }];
    assert_eq!(bootstrap_houses(&app.state, &houses).await.unwrap(), 1);
    assert_eq!(bootstrap_houses(&app.state, &houses).await.unwrap(), 0);

    let (status, _, login) = app
        .call(
            Method::POST,
            "/api/auth/house",
            None,
            Some(json!({ "code": "casa-lima", "pin": "4826" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["members"][0]["needsActivation"], true);
}
