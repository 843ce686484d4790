mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha512;
use tower::ServiceExt;

use studiobook::{
    api::create_app,
    auth::AuthService,
    config::Settings,
    domain::{BookingStatus, Role},
    payments::{PaymentGateway, SIGNATURE_HEADER},
    repository::{
        BookingRepository, PaymentRepository, SqliteBookingRepository, SqlitePaymentRepository,
        SqliteUserRepository, UserRepository,
    },
    service::ServiceContext,
};

use common::*;

const SECRET: &str = "sk_test_studiobook";

struct TestApp {
    router: Router,
    pool: sqlx::SqlitePool,
    gateway: Arc<FakeGateway>,
}

async fn test_app() -> anyhow::Result<TestApp> {
    let pool = setup_pool().await?;

    let mut settings = Settings::default();
    settings.paystack.enabled = true;
    settings.paystack.secret_key = Some(SECRET.to_string());
    settings.storage.uploads_dir = std::env::temp_dir()
        .join(format!("studiobook-api-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let gateway = FakeGateway::new();
    let dyn_gateway: Arc<dyn PaymentGateway> = gateway.clone();
    let ctx = Arc::new(ServiceContext::new(pool.clone(), Some(dyn_gateway), &settings));

    Ok(TestApp {
        router: create_app(ctx, Arc::new(settings)),
        pool,
        gateway,
    })
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn webhook_request(body: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/payments/webhook/paystack")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn signup(app: &TestApp, email: &str) -> String {
    let (status, cookie, _) = send(
        app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({"email": email, "full_name": "Ada Obi", "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    cookie.expect("signup sets a session cookie")
}

async fn admin_cookie(app: &TestApp) -> anyhow::Result<String> {
    let users = SqliteUserRepository::new(app.pool.clone());
    let hash = AuthService::hash_password("admin-password")?;
    let admin = users.create("owner@example.com", "Studio Owner", &hash).await?;
    users.grant_role(admin.id, Role::Admin).await?;

    let (status, cookie, _) = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": "owner@example.com", "password": "admin-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    Ok(cookie.expect("login sets a session cookie"))
}

#[tokio::test]
async fn test_health() -> anyhow::Result<()> {
    let app = test_app().await?;
    let request = Request::builder().uri("/health").body(Body::empty())?;
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() -> anyhow::Result<()> {
    let app = test_app().await?;
    let body = r#"{"event":"charge.success","data":{"status":"success","reference":"r1","amount":100}}"#;

    let (status, _, _) = send(&app, webhook_request(body, "deadbeef")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_webhook_without_data() -> anyhow::Result<()> {
    let app = test_app().await?;
    let body = r#"{"event":"charge.success"}"#;

    let (status, _, json) = send(&app, webhook_request(body, &sign(body.as_bytes()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No data in webhook payload");
    Ok(())
}

#[tokio::test]
async fn test_webhook_confirms_matching_booking() -> anyhow::Result<()> {
    let app = test_app().await?;
    let user = create_user(&app.pool, "ada@example.com").await?;
    let booking = insert_booking(&app.pool, &user, 70_000, BookingStatus::PaymentPending, None).await?;

    let body = json!({
        "event": "charge.success",
        "data": {
            "id": 42,
            "status": "success",
            "reference": "T_hook_1",
            "amount": 7_000_000,
            "currency": "NGN",
            "customer": {"email": "ada@example.com"},
            "paid_at": "2026-01-05T10:00:00Z",
            "channel": "card",
            "gateway_response": "Successful"
        }
    })
    .to_string();

    let (status, _, json) = send(&app, webhook_request(&body, &sign(body.as_bytes()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["booking_id"], booking.id.to_string());

    let bookings = SqliteBookingRepository::new(app.pool.clone());
    let booking = bookings.find_by_id(booking.id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    Ok(())
}

#[tokio::test]
async fn test_webhook_failed_charge_is_a_no_op() -> anyhow::Result<()> {
    let app = test_app().await?;
    let body = r#"{"event":"charge.failed","data":{"status":"failed","reference":"T_f","amount":100}}"#;

    let (status, _, json) = send(&app, webhook_request(body, &sign(body.as_bytes()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Payment status is failed, no update performed");
    Ok(())
}

#[tokio::test]
async fn test_booking_flow_through_checkout() -> anyhow::Result<()> {
    let app = test_app().await?;
    let cookie = signup(&app, "ada@example.com").await;

    let past = Utc::now().date_naive() - Duration::days(1);
    let mut booking = json!({
        "package_id": "standard",
        "booking_date": past,
        "booking_time": "7:00 PM",
        "couples": true,
        "client_name": "Ada Obi",
        "client_email": "ada@example.com"
    });

    let (status, _, _) = send(&app, json_request("POST", "/api/bookings", Some(&cookie), booking.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    booking["booking_date"] = json!(Utc::now().date_naive());
    let (status, _, _) = send(&app, json_request("POST", "/api/bookings", Some(&cookie), booking.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    booking["booking_date"] = json!(tomorrow());
    let (status, _, json) = send(&app, json_request("POST", "/api/bookings", Some(&cookie), booking)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["booking"]["status"], "payment_pending");
    assert_eq!(json["booking"]["price_tier"], "night");
    assert_eq!(json["booking"]["package_price"], 95_000);
    assert!(json["authorization_url"].as_str().unwrap().starts_with("https://checkout.test/"));

    let initialized = app.gateway.initialized.lock().unwrap().clone();
    assert_eq!(initialized.len(), 1);
    assert_eq!(initialized[0].1, 9_500_000);
    assert_eq!(json["booking"]["payment_reference"], initialized[0].2.as_str());

    let list = Request::builder()
        .uri("/api/bookings")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let (status, _, json) = send(&app, list).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_booking_requires_session_and_fields() -> anyhow::Result<()> {
    let app = test_app().await?;

    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/bookings", None, json!({"package_id": "basic"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = signup(&app, "ada@example.com").await;
    let (status, _, json) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings",
            Some(&cookie),
            json!({"package_id": "basic", "booking_time": "2:00 PM"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Please fill in all required fields.");
    Ok(())
}

#[tokio::test]
async fn test_quote_tracks_evening_slots() -> anyhow::Result<()> {
    let app = test_app().await?;

    let (status, _, json) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings/quote",
            None,
            json!({"package_id": "basic", "time": "8:00 PM"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tier"], "night");
    assert_eq!(json["tier_change"], "upgraded");
    assert_eq!(json["night_unavailable"], true);
    Ok(())
}

#[tokio::test]
async fn test_verify_requires_reference() -> anyhow::Result<()> {
    let app = test_app().await?;

    let (status, _, json) = send(
        &app,
        json_request("POST", "/api/payments/verify", None, json!({"reference": " "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Transaction reference is required");
    Ok(())
}

#[tokio::test]
async fn test_verify_confirms_booking() -> anyhow::Result<()> {
    let app = test_app().await?;
    let user = create_user(&app.pool, "ada@example.com").await?;
    let booking = insert_booking(&app.pool, &user, 35_000, BookingStatus::PaymentPending, Some("bk_verify")).await?;

    app.gateway.set_verify_response(studiobook::payments::GatewayResponse {
        status: true,
        message: "Verification successful".to_string(),
        data: Some(success_charge("bk_verify", 3_500_000)),
    });

    let (status, _, json) = send(
        &app,
        json_request("POST", "/api/payments/verify", None, json!({"reference": "bk_verify"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Payment verified and booking confirmed");
    assert_eq!(json["booking_id"], booking.id.to_string());
    Ok(())
}

#[tokio::test]
async fn test_verify_ignores_a_different_transaction() -> anyhow::Result<()> {
    let app = test_app().await?;
    let user = create_user(&app.pool, "ada@example.com").await?;
    let booking = insert_booking(&app.pool, &user, 70_000, BookingStatus::PaymentPending, Some("bk_mine")).await?;

    // A settled payout for the same amount must not pass for the client's charge.
    app.gateway.set_verify_response(studiobook::payments::GatewayResponse {
        status: true,
        message: "Verification successful".to_string(),
        data: Some(success_charge("tx_payout_1", 7_000_000)),
    });

    let (status, _, json) = send(
        &app,
        json_request("POST", "/api/payments/verify", None, json!({"reference": "bk_mine"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Verified transaction does not match the requested reference");

    let (status, _, json) = send(
        &app,
        json_request(
            "POST",
            "/api/payments/verify",
            None,
            json!({"reference": "../../transfer/TRF_1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid transaction reference");

    let bookings = SqliteBookingRepository::new(app.pool.clone());
    let booking = bookings.find_by_id(booking.id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::PaymentPending);
    assert_eq!(SqlitePaymentRepository::new(app.pool.clone()).count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_booking_contact_defaults_to_profile() -> anyhow::Result<()> {
    let app = test_app().await?;
    let cookie = signup(&app, "ada@example.com").await;

    let (status, _, json) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings",
            Some(&cookie),
            json!({
                "package_id": "basic",
                "booking_date": tomorrow(),
                "booking_time": "2:00 PM",
                "client_name": "  "
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["booking"]["client_name"], "Ada Obi");
    assert_eq!(json["booking"]["client_email"], "ada@example.com");

    let initialized = app.gateway.initialized.lock().unwrap().clone();
    assert_eq!(initialized[0].0, "ada@example.com");
    Ok(())
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() -> anyhow::Result<()> {
    let app = test_app().await?;

    let anonymous = Request::builder().uri("/admin/stats").body(Body::empty())?;
    let (status, _, _) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let client = signup(&app, "ada@example.com").await;
    let as_client = Request::builder()
        .uri("/admin/stats")
        .header(header::COOKIE, &client)
        .body(Body::empty())?;
    let (status, _, _) = send(&app, as_client).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_cookie(&app).await?;
    let as_admin = Request::builder()
        .uri("/admin/stats")
        .header(header::COOKIE, &admin)
        .body(Body::empty())?;
    let (status, _, json) = send(&app, as_admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bookings"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn test_admin_confirms_pending_booking() -> anyhow::Result<()> {
    let app = test_app().await?;
    let user = create_user(&app.pool, "ada@example.com").await?;
    let booking = insert_booking(&app.pool, &user, 70_000, BookingStatus::Pending, None).await?;
    let admin = admin_cookie(&app).await?;

    let uri = format!("/admin/bookings/{}/confirm", booking.id);
    let (status, _, json) = send(&app, json_request("POST", &uri, Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "confirmed");

    let uri = format!("/admin/bookings/{}/status", booking.id);
    let (status, _, json) = send(
        &app,
        json_request("PUT", &uri, Some(&admin), json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");
    Ok(())
}

#[tokio::test]
async fn test_upload_reports_partial_failures() -> anyhow::Result<()> {
    let app = test_app().await?;
    let cookie = signup(&app, "ada@example.com").await;

    let boundary = "studiobook-boundary";
    let mut body = Vec::new();
    for (name, data) in [("mood.png", &b"\x89PNG fake"[..]), ("notes.exe", &b"MZ"[..])] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))?;

    let (status, _, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["uploaded"][0]["name"], "mood.png");
    assert_eq!(json["failed"][0]["name"], "notes.exe");
    Ok(())
}
