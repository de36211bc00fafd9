//! HTTP API 测试 - 通过 tower oneshot 调用完整路由 (含认证中间件)

use axum::Router;
use axum::body::{Body, to_bytes};
use chrono::{Days, Utc};
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use cafe_server::api::build_router;
use cafe_server::{Config, ServerState};

struct TestApp {
    state: ServerState,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        let state = ServerState::in_memory(config).unwrap();
        Self { state, _dir: dir }
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let admin = self.state.config.admin.clone();
        self.login(&admin.email, &admin.password).await
    }

    async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        assert_eq!(body["user"]["role"], "CUSTOMER");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_table(&self, admin: &str, number: &str, capacity: u32) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/tables",
                Some(admin),
                Some(json!({
                    "table_number": number,
                    "capacity": capacity,
                    "position": "Window",
                    "location_id": "loc-1",
                    "location_name": "Downtown",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create table failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}

fn booking_body(table_id: &str) -> Value {
    json!({
        "table_id": table_id,
        "date": Utc::now().date_naive().checked_add_days(Days::new(7)).unwrap(),
        "time_slot": "06:00 PM",
        "guests": 2,
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = TestApp::new();

    let (status, body) = app.request("GET", "/api/bookings/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3001");

    let (status, body) = app
        .request("GET", "/api/bookings/mine", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3002");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_customer_cannot_reach_admin_routes() {
    let app = TestApp::new();
    let customer = app.register("Ada", "ada@example.com").await;

    for (method, uri) in [
        ("GET", "/api/staff"),
        ("GET", "/api/bookings"),
        ("GET", "/api/invites"),
        ("GET", "/api/sync/changes"),
    ] {
        let (status, body) = app.request(method, uri, Some(&customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(body["code"], "E2001");
    }
}

#[tokio::test]
async fn test_booking_and_order_over_http() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let customer = app.register("Ada", "ada@example.com").await;
    let table_id = app.create_table(&admin, "T5", 4).await;

    let (status, booking) = app
        .request("POST", "/api/bookings", Some(&customer), Some(booking_body(&table_id)))
        .await;
    assert_eq!(status, StatusCode::OK, "{booking}");
    assert_eq!(booking["status"], "CONFIRMED");
    let booking_id = booking["id"].as_str().unwrap();

    let (status, assignments) = app
        .request("GET", "/api/tables/assignments", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assignments[0]["status"], "BOOKED");
    assert_eq!(assignments[0]["customer_name"], "Ada");

    let (status, order) = app
        .request(
            "POST",
            "/api/orders",
            Some(&customer),
            Some(json!({
                "booking_id": booking_id,
                "items": [
                    { "id": "latte", "name": "Latte", "price": 4.99, "quantity": 1 },
                    { "id": "croissant", "name": "Croissant", "price": 3.49, "quantity": 1 },
                ],
                "payment_mode": "CARD",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["total"], 9.33);
    assert_eq!(order["payment_status"], "PAID");
    let order_id = order["id"].as_str().unwrap();

    // Customer cancels: paid order goes to refund
    let (status, cancellation) = app
        .request(
            "POST",
            &format!("/api/orders/{order_id}/cancel"),
            Some(&customer),
            Some(json!({ "reason": "Changed my mind" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{cancellation}");
    assert_eq!(cancellation["order"]["payment_status"], "REFUND_PENDING");

    let (status, pending) = app
        .request("GET", "/api/payments/refunds/pending", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    // Second cancel is an illegal transition
    let (status, body) = app
        .request(
            "POST",
            &format!("/api/orders/{order_id}/cancel"),
            Some(&customer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E0005");

    let (status, unread) = app
        .request("GET", "/api/notifications/unread-count", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unread["unread"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn test_other_customer_cannot_cancel_booking() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let owner = app.register("Ada", "ada@example.com").await;
    let other = app.register("Bob", "bob@example.com").await;
    let table_id = app.create_table(&admin, "T2", 2).await;

    let (_, booking) = app
        .request("POST", "/api/bookings", Some(&owner), Some(booking_body(&table_id)))
        .await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, _) = app
        .request("GET", &format!("/api/bookings/{booking_id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancellation) = app
        .request(
            "POST",
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancellation["booking"]["status"], "CANCELLED");
}

#[tokio::test]
async fn test_invite_flow_over_http() {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let (status, created) = app
        .request(
            "POST",
            "/api/invites",
            Some(&admin),
            Some(json!({ "role": "WAITER", "email": "wes@cafe.local" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let token = created["token"].as_str().unwrap().to_string();
    assert!(created["link"].as_str().unwrap().contains("role=WAITER"));

    // Public endpoints, no Authorization header
    let (status, validation) = app
        .request("GET", &format!("/api/invites/validate?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], true);

    let (status, staff) = app
        .request(
            "POST",
            "/api/invites/accept",
            None,
            Some(json!({
                "token": token,
                "name": "Wes",
                "email": "wes@cafe.local",
                "password": "serve-fast",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{staff}");
    assert_eq!(staff["role"], "WAITER");

    let (status, validation) = app
        .request("GET", &format!("/api/invites/validate?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], false);

    // The new waiter can log in and read the order board but not manage staff
    let waiter = app.login("wes@cafe.local", "serve-fast").await;
    let (status, _) = app.request("GET", "/api/orders", Some(&waiter), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", "/api/staff", Some(&waiter), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = app
        .request("GET", "/api/invites/stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["accepted"], 1);
}

#[tokio::test]
async fn test_sync_changes_pages_through_log() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    for n in 1..=3 {
        app.create_table(&admin, &format!("T{n}"), 4).await;
    }

    let (status, page) = app
        .request("GET", "/api/sync/changes?since=0&limit=2", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let changes = page["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0]["sequence"], 1);
    assert_eq!(page["has_more"], true);

    let server_sequence = page["server_sequence"].as_u64().unwrap();
    let (_, tail) = app
        .request(
            "GET",
            &format!("/api/sync/changes?since={}", server_sequence - 1),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(tail["changes"].as_array().unwrap().len(), 1);
    assert_eq!(tail["has_more"], false);
}

#[tokio::test]
async fn test_chef_sync_feed_hides_accounts_and_inboxes() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    app.register("Ada", "ada@example.com").await;
    app.create_table(&admin, "T1", 4).await;

    let (status, created) = app
        .request(
            "POST",
            "/api/invites",
            Some(&admin),
            Some(json!({ "role": "CHEF" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let (status, _) = app
        .request(
            "POST",
            "/api/invites/accept",
            None,
            Some(json!({
                "token": created["token"],
                "name": "Remy",
                "email": "remy@cafe.local",
                "password": "ratatouille",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let chef = app.login("remy@cafe.local", "ratatouille").await;

    let (status, page) = app
        .request("GET", "/api/sync/changes?since=0&limit=1000", Some(&chef), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!page.to_string().contains("password_hash"));
    assert!(!page.to_string().contains("$argon2"));
    let collections: Vec<&str> = page["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["collection"].as_str().unwrap())
        .collect();
    assert!(collections.contains(&"tables"));
    assert!(
        collections
            .iter()
            .all(|c| !["accounts", "notifications", "invites"].contains(c)),
        "{collections:?}"
    );
    // skipped records still advance the cursor
    assert_eq!(page["next_since"], page["server_sequence"]);

    // admins get account changes, but only the public projection
    let (_, page) = app
        .request("GET", "/api/sync/changes?since=0&limit=1000", Some(&admin), None)
        .await;
    let accounts: Vec<&Value> = page["changes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["collection"] == "accounts")
        .collect();
    assert!(!accounts.is_empty());
    assert!(accounts.iter().all(|c| c["data"].get("password_hash").is_none()));
}

#[tokio::test]
async fn test_profile_and_password_over_http() {
    let app = TestApp::new();
    let customer = app.register("Ada", "ada@example.com").await;

    let (status, me) = app
        .request(
            "PUT",
            "/api/auth/me",
            Some(&customer),
            Some(json!({ "name": "  Ada L.  ", "phone": "555-0101" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{me}");
    assert_eq!(me["name"], "Ada L.");
    assert_eq!(me["phone"], "555-0101");
    assert_eq!(me["email"], "ada@example.com");

    let (status, body) = app
        .request(
            "PUT",
            "/api/auth/password",
            Some(&customer),
            Some(json!({ "current_password": "wrong-pass", "new_password": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .request(
            "PUT",
            "/api/auth/password",
            Some(&customer),
            Some(json!({ "current_password": "secret-pass", "new_password": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    app.login("ada@example.com", "fresh-pass").await;
    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disabled_account_loses_access() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let customer = app.register("Ada", "ada@example.com").await;
    let (_, me) = app.request("GET", "/api/auth/me", Some(&customer), None).await;
    let customer_id = me["id"].as_str().unwrap().to_string();

    // Customers cannot manage accounts
    let (status, _) = app
        .request("GET", "/api/accounts", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, accounts) = app.request("GET", "/api/accounts", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accounts.as_array().unwrap().len(), 2);
    assert!(!accounts.to_string().contains("password_hash"));

    let (status, disabled) = app
        .request(
            "PUT",
            &format!("/api/accounts/{customer_id}/status"),
            Some(&admin),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{disabled}");
    assert_eq!(disabled["is_active"], false);

    // The token issued before the change stops working
    let (status, _) = app.request("GET", "/api/auth/me", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/accounts/{customer_id}/status"),
            Some(&admin),
            Some(json!({ "is_active": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.login("ada@example.com", "secret-pass").await;
}

#[tokio::test]
async fn test_customer_sessions_follow_bookings() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let customer = app.register("Ada", "ada@example.com").await;
    let (_, me) = app.request("GET", "/api/auth/me", Some(&customer), None).await;
    let customer_id = me["id"].as_str().unwrap().to_string();
    let table_id = app.create_table(&admin, "T5", 4).await;

    let (status, session) = app
        .request("GET", &format!("/api/sessions/{customer_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{session}");
    assert_eq!(session["status"], "BROWSING");

    let (status, booking) = app
        .request("POST", "/api/bookings", Some(&customer), Some(booking_body(&table_id)))
        .await;
    assert_eq!(status, StatusCode::OK, "{booking}");

    let (status, sessions) = app.request("GET", "/api/sessions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["customer_id"], customer_id.as_str());
    assert_eq!(sessions[0]["status"], "BOOKING_CONFIRMED");
    assert_eq!(sessions[0]["current_booking_id"], booking["id"]);
    assert_eq!(sessions[0]["table_number"], "T5");

    // Customers do not see other people's sessions
    let (status, _) = app.request("GET", "/api/sessions", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
