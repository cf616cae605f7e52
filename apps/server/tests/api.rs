//! In-process tests for the HTTP API.
//!
//! Each test builds the router over an in-memory database and drives it
//! with `tower::ServiceExt::oneshot`; no socket is bound.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Days, Duration, Local};
use http_body_util::BodyExt;
use innkeep_db::{Database, DbConfig};
use innkeep_server::{build_router, AppState, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const USER_ID: &str = "user-1";
const TENANT: &str = "grand-hotel";

struct TestApp {
    router: axum::Router,
    token: String,
}

async fn app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ServerConfig {
        jwt_secret: "test-secret".into(),
        ..ServerConfig::default()
    };
    let state = AppState::new(db, config);
    let token = state
        .jwt
        .issue(USER_ID, TENANT, "admin", Duration::hours(1))
        .unwrap();

    TestApp {
        router: build_router(state),
        token,
    }
}

impl TestApp {
    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .body(Body::empty())
            .unwrap();
        self.call(req).await
    }

    async fn send(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.call(req).await
    }

    /// Profile in Karnataka, a ₹1000 Deluxe category at 12% GST, room 101.
    async fn hotel(&self) {
        let (status, _) = self
            .send(
                "PUT",
                &format!("/api/Profile/{USER_ID}"),
                json!({ "hotelName": "Grand Hotel", "state": "Karnataka" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, category) = self
            .send(
                "POST",
                "/api/roomCategories",
                json!({ "name": "Deluxe", "tariff": 100_000, "gstRate": 1200 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = self
            .send(
                "POST",
                "/api/rooms",
                json!({ "number": "101", "categoryId": category["data"]["id"] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    /// One night in room 101 starting today.
    async fn book(&self) -> Value {
        let today = Local::now().date_naive();
        let tomorrow = today + Days::new(1);
        let (status, body) = self
            .send(
                "POST",
                "/api/NewBooking",
                json!({
                    "guestName": "Asha Rao",
                    "mobileNo": "9876543210",
                    "checkIn": today.to_string(),
                    "checkOut": tomorrow.to_string(),
                    "roomNumbers": ["101"],
                    "state": "Karnataka",
                    "adults": 2
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].clone()
    }
}

// ---------------------------------------------------------------------------
// Health & auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_token() {
    let app = app().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = app().await;
    let req = Request::builder().uri("/api/rooms").body(Body::empty()).unwrap();

    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn user_cookie_is_accepted() {
    let app = app().await;
    let req = Request::builder()
        .uri("/api/rooms")
        .header(header::COOKIE, format!("userAuthToken={}", app.token))
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn other_users_profile_is_forbidden() {
    let app = app().await;
    let (status, body) = app.get("/api/Profile/user-2").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_room_number_conflicts() {
    let app = app().await;
    app.hotel().await;

    let (_, rooms) = app.get("/api/rooms").await;
    let category_id = rooms["data"][0]["categoryId"].clone();

    let (status, body) = app
        .send(
            "POST",
            "/api/rooms",
            json!({ "number": "101", "categoryId": category_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE");
}

#[tokio::test]
async fn invalid_booking_is_bad_request() {
    let app = app().await;
    app.hotel().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/NewBooking",
            json!({
                "guestName": "",
                "mobileNo": "9876543210",
                "checkIn": "2026-03-02",
                "checkOut": "2026-03-03",
                "roomNumbers": ["101"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Booking → payment → completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn booking_settles_and_checks_out() {
    let app = app().await;
    app.hotel().await;

    let receipt = app.book().await;
    let bill_id = receipt["ledger"]["id"].as_str().unwrap().to_string();
    assert_eq!(receipt["ledger"]["dueAmount"], 112_000);

    let (_, rooms) = app.get("/api/rooms").await;
    assert_eq!(rooms["data"][0]["occupied"], "Confirmed");
    assert_eq!(rooms["data"][0]["currentBillingId"], bill_id.as_str());

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/Billing/{bill_id}/complete"),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BUSINESS_RULE");

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/Billing/{bill_id}/payments"),
            json!({ "amount": 112_000, "mode": "Cash" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dueAmount"], 0);

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/Billing/{bill_id}/complete"),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["billPaid"], true);

    let (_, rooms) = app.get("/api/rooms").await;
    assert_eq!(rooms["data"][0]["occupied"], "Vacant");
    assert_eq!(rooms["data"][0]["clean"], true);
    assert_eq!(rooms["data"][0]["waitlist"], json!([]));
}

#[tokio::test]
async fn legacy_waitlist_stays_aligned_after_promotion() {
    let app = app().await;
    app.hotel().await;

    let first = app.book().await;
    let today = Local::now().date_naive();
    let (status, second) = app
        .send(
            "POST",
            "/api/NewBooking",
            json!({
                "guestName": "Ravi Kumar",
                "mobileNo": "9123456780",
                "checkIn": (today + Days::new(1)).to_string(),
                "checkOut": (today + Days::new(2)).to_string(),
                "roomNumbers": ["101"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{second}");

    let (_, rooms) = app.get("/api/rooms").await;
    let room_id = rooms["data"][0]["id"].as_str().unwrap().to_string();
    let legacy_uri = format!("/api/rooms/{room_id}/legacy");

    let (status, arrays) = app.get(&legacy_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(arrays["data"]["billWaitlist"].as_array().unwrap().len(), 2);

    let bill_id = first["ledger"]["id"].as_str().unwrap();
    app.send(
        "POST",
        &format!("/api/Billing/{bill_id}/payments"),
        json!({ "amount": 112_000, "mode": "Cash" }),
    )
    .await;
    let (status, _) = app
        .send("POST", &format!("/api/Billing/{bill_id}/complete"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, arrays) = app.get(&legacy_uri).await;
    let data = &arrays["data"];
    for key in ["guestWaitlist", "billWaitlist", "checkInDateList", "checkOutDateList"] {
        assert_eq!(data[key].as_array().unwrap().len(), 1, "{key}");
    }
    assert_eq!(data["billWaitlist"][0], second["data"]["ledger"]["id"]);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let app = app().await;
    app.hotel().await;
    let receipt = app.book().await;
    let bill_id = receipt["ledger"]["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/Billing/{bill_id}/payments"),
            json!({ "amount": 500_000, "mode": "Cash" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BUSINESS_RULE");
}

#[tokio::test]
async fn stale_ledger_version_conflicts() {
    let app = app().await;
    app.hotel().await;
    let receipt = app.book().await;
    let bill_id = receipt["ledger"]["id"].as_str().unwrap();
    let version = receipt["ledger"]["version"].as_i64().unwrap();

    let item = |version: i64| {
        json!({
            "roomIndex": 0,
            "name": "Laundry",
            "unitPrice": 15_000,
            "quantity": 1,
            "sgstRate": 0,
            "cgstRate": 0,
            "version": version
        })
    };

    let (status, body) = app
        .send("POST", &format!("/api/Billing/{bill_id}/items"), item(version))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["dueAmount"], 127_000);

    let (status, body) = app
        .send("POST", &format!("/api/Billing/{bill_id}/items"), item(version))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn ledgers_are_tenant_scoped() {
    let app = app().await;
    app.hotel().await;
    let receipt = app.book().await;
    let bill_id = receipt["ledger"]["id"].as_str().unwrap();

    let other_token = innkeep_server::auth::JwtManager::new("test-secret")
        .issue("user-9", "other-hotel", "admin", Duration::hours(1))
        .unwrap();
    let req = Request::builder()
        .uri(format!("/api/Billing/{bill_id}"))
        .header(header::COOKIE, format!("authToken={other_token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overselling_stock_is_rejected() {
    let app = app().await;

    let (_, category) = app
        .send("POST", "/api/InventoryCategory", json!({ "name": "Kitchen" }))
        .await;
    let (status, item) = app
        .send(
            "POST",
            "/api/InventoryList",
            json!({
                "categoryId": category["data"]["id"],
                "name": "Rice",
                "quantityUnit": "kg"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{item}");
    let item_id = item["data"]["id"].clone();

    let movement = |direction: &str, quantity: i64| {
        json!({
            "itemId": item_id,
            "direction": direction,
            "quantity": quantity,
            "occurredOn": "2026-03-01"
        })
    };

    let (status, body) = app.send("POST", "/api/stockreport", movement("purchase", 3)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["item"]["stock"], 3);

    let (status, body) = app.send("POST", "/api/stockreport", movement("sell", 5)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (_, report) = app.get("/api/stockreport").await;
    assert_eq!(report["data"].as_array().unwrap().len(), 1);
}
