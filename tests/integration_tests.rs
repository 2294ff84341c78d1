use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Days, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use gigbook::config::AppConfig;
use gigbook::db::{self, queries};
use gigbook::handlers;
use gigbook::models::{BookingStatus, IntentStatus, PaymentIntentRecord};
use gigbook::services::notifications::{EmailProvider, OutgoingEmail};
use gigbook::services::payments::{CreatedIntent, IntentRequest, PaymentGateway};
use gigbook::services::reminders;
use gigbook::state::AppState;

// ── Mock Providers ──

struct MockGateway {
    counter: AtomicU64,
    fail: Arc<AtomicBool>,
}

impl MockGateway {
    fn new(fail: Arc<AtomicBool>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            fail,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(&self, request: &IntentRequest) -> anyhow::Result<CreatedIntent> {
        anyhow::ensure!(request.amount > 0, "amount must be positive");
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("processor unreachable");
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedIntent {
            id: format!("pi_test_{n}"),
            client_secret: format!("pi_test_{n}_secret"),
        })
    }
}

struct MockMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl EmailProvider for MockMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("email provider rejected message");
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ── Helpers ──

struct TestHarness {
    state: Arc<AppState>,
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    mailer_fail: Arc<AtomicBool>,
    gateway_fail: Arc<AtomicBool>,
}

fn test_config(webhook_secret: &str) -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        stripe_secret_key: "sk_test".to_string(),
        stripe_webhook_secret: webhook_secret.to_string(),
        email_api_url: "http://localhost:0".to_string(),
        email_service_id: "service_test".to_string(),
        email_template_id: "template_test".to_string(),
        email_user_id: "user_test".to_string(),
        admin_email: "owner@example.com".to_string(),
        venmo_url: "https://venmo.com/u/test-merchant".to_string(),
        cashapp_url: "https://cash.app/$testmerchant".to_string(),
    }
}

fn harness_with_secret(webhook_secret: &str) -> TestHarness {
    let conn = db::init_db(":memory:").unwrap();
    let sent = Arc::new(Mutex::new(vec![]));
    let mailer_fail = Arc::new(AtomicBool::new(false));
    let gateway_fail = Arc::new(AtomicBool::new(false));

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(webhook_secret),
        gateway: Box::new(MockGateway::new(Arc::clone(&gateway_fail))),
        mailer: Box::new(MockMailer {
            sent: Arc::clone(&sent),
            fail: Arc::clone(&mailer_fail),
        }),
    });

    TestHarness {
        state,
        sent,
        mailer_fail,
        gateway_fail,
    }
}

fn harness() -> TestHarness {
    harness_with_secret("")
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id/pay", post(handlers::bookings::pay_booking))
        .route(
            "/api/create-payment-intent",
            post(handlers::payments::create_payment_intent),
        )
        .route(
            "/api/payment-confirmation",
            post(handlers::payments::confirm_payment),
        )
        .route("/webhook/stripe", post(handlers::webhook::stripe_webhook))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .with_state(state)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_payload() -> serde_json::Value {
    serde_json::json!({
        "clientName": "Alice Smith",
        "email": "alice@example.com",
        "phone": "(555) 123-4567",
        "eventType": "Wedding",
        "guestCount": 120,
        "venueName": "Grand Hall",
        "venueAddress": "123 Main St",
        "eventDate": "2026-10-04",
        "startTime": "7:00 PM",
        "endTime": "1:00 AM",
        "lighting": true,
        "photography": true,
        "agreeToTerms": true
    })
}

async fn create_booking(app: &Router) -> (String, i64) {
    let res = app
        .clone()
        .oneshot(json_request("/api/bookings", booking_payload()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    (
        body["id"].as_str().unwrap().to_string(),
        body["totalAmount"].as_i64().unwrap(),
    )
}

async fn pay_card(app: &Router, booking_id: &str) {
    let res = app
        .clone()
        .oneshot(json_request(
            &format!("/api/bookings/{booking_id}/pay"),
            serde_json::json!({"paymentMethod": "card"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

fn succeeded_event(intent_id: &str, amount: i64) -> serde_json::Value {
    serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": intent_id,
            "amount": amount,
            "receipt_email": "alice@example.com"
        }}
    })
}

// ── Booking Creation ──

#[tokio::test]
async fn test_create_booking_computes_pricing() {
    let h = harness();
    let app = test_app(h.state);

    let (id, total) = create_booking(&app).await;
    // 7:00 PM - 1:00 AM is six hours: two beyond the base allowance.
    // 350 + 100 lighting + 150 photography + 2 * 75 = 750 dollars.
    assert_eq!(total, 75_000);
    assert!(!id.is_empty());

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["totalDisplay"], "$750.00");
}

#[tokio::test]
async fn test_create_booking_rejects_invalid_input() {
    let h = harness();
    let app = test_app(h.state);

    let cases = [
        ("email", serde_json::json!("not-an-email")),
        ("phone", serde_json::json!("12345")),
        ("venueAddress", serde_json::json!("no digits here")),
        ("agreeToTerms", serde_json::json!(false)),
    ];

    for (field, value) in cases {
        let mut payload = booking_payload();
        payload[field] = value;
        let res = app
            .clone()
            .oneshot(json_request("/api/bookings", payload))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "field: {field}");
    }
}

#[tokio::test]
async fn test_get_unknown_booking_is_404() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Payment Routing ──

#[tokio::test]
async fn test_card_routing_returns_client_secret_and_persists_mirror() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    let res = app
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "card"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["step"], "card_checkout");
    assert_eq!(body["clientSecret"], "pi_test_0_secret");

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::AwaitingPayment);

    let intent = queries::get_intent_by_id(&db, "pi_test_0").unwrap().unwrap();
    assert_eq!(intent.booking_id.as_deref(), Some(id.as_str()));
    assert_eq!(intent.amount, total);
    assert_eq!(intent.status, IntentStatus::RequiresConfirmation);
}

#[tokio::test]
async fn test_external_routing_returns_link() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, _) = create_booking(&app).await;
    let res = app
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "venmo"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["step"], "external_link");
    assert_eq!(body["url"], "https://venmo.com/u/test-merchant");
    assert!(body["instructions"].as_str().unwrap().contains("$750"));

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::AwaitingExternalConfirmation);
}

#[tokio::test]
async fn test_gateway_failure_leaves_booking_pending() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, _) = create_booking(&app).await;
    h.gateway_fail.store(true, Ordering::SeqCst);

    let res = app
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "card"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_unknown_payment_method_rejected() {
    let h = harness();
    let app = test_app(h.state);

    let (id, _) = create_booking(&app).await;
    let res = app
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "barter"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Payment Intent Endpoint ──

#[tokio::test]
async fn test_create_payment_intent_requires_amount_and_email() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .clone()
        .oneshot(json_request(
            "/api/create-payment-intent",
            serde_json::json!({"email": "alice@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(json_request(
            "/api/create-payment-intent",
            serde_json::json!({"amount": 60000}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_payment_intent_links_existing_booking() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    let res = app
        .oneshot(json_request(
            "/api/create-payment-intent",
            serde_json::json!({
                "amount": total,
                "email": "alice@example.com",
                "clientName": "Alice Smith",
                "eventType": "Wedding",
                "eventDate": "2026-10-04",
                "venueName": "Grand Hall"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["clientSecret"], "pi_test_0_secret");

    let db = h.state.db.lock().unwrap();
    let intent = queries::get_intent_by_id(&db, "pi_test_0").unwrap().unwrap();
    assert_eq!(intent.booking_id.as_deref(), Some(id.as_str()));
}

// ── Webhook Reconciliation ──

#[tokio::test]
async fn test_webhook_marks_booking_paid_and_sends_emails() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    pay_card(&app, &id).await;

    let res = app
        .oneshot(json_request(
            "/webhook/stripe",
            succeeded_event("pi_test_0", total),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
    assert_eq!(booking.paid_amount, Some(total));
    assert!(booking.confirmation_email_sent);
    assert!(booking.receipt_sent);

    let intent = queries::get_intent_by_id(&db, "pi_test_0").unwrap().unwrap();
    assert_eq!(intent.status, IntentStatus::Succeeded);

    // Client confirmation with receipt attached, plus the operator alert.
    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "alice@example.com");
    assert!(sent[0].attachment.as_ref().unwrap().data.starts_with(b"%PDF"));
    assert_eq!(sent[1].to, "owner@example.com");
}

#[tokio::test]
async fn test_webhook_retry_is_idempotent() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    pay_card(&app, &id).await;

    for _ in 0..2 {
        let res = app
            .clone()
            .oneshot(json_request(
                "/webhook/stripe",
                succeeded_event("pi_test_0", total),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);

    // The replay produced no second confirmation email.
    assert_eq!(h.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_webhook_unknown_intent_still_200() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(json_request(
            "/webhook/stripe",
            succeeded_event("pi_unknown", 60000),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn test_webhook_reconciles_by_email_and_date_fallback() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    pay_card(&app, &id).await;

    // Intent mirror without a booking back-reference: only the metadata
    // (email, event date) ties it to the booking.
    {
        let db = h.state.db.lock().unwrap();
        let now = Utc::now().naive_utc();
        queries::create_intent(
            &db,
            &PaymentIntentRecord {
                id: "pi_orphan".to_string(),
                booking_id: None,
                amount: total,
                currency: "usd".to_string(),
                status: IntentStatus::RequiresConfirmation,
                client_name: "Alice Smith".to_string(),
                email: "alice@example.com".to_string(),
                event_type: "Wedding".to_string(),
                event_date: "2026-10-04".to_string(),
                venue_name: "Grand Hall".to_string(),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    let res = app
        .oneshot(json_request(
            "/webhook/stripe",
            succeeded_event("pi_orphan", total),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
}

#[tokio::test]
async fn test_webhook_payment_failed_marks_booking() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, _) = create_booking(&app).await;
    pay_card(&app, &id).await;

    let res = app
        .oneshot(json_request(
            "/webhook/stripe",
            serde_json::json!({
                "type": "payment_intent.payment_failed",
                "data": { "object": { "id": "pi_test_0", "amount": 75000 } }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::PaymentFailed);
    let intent = queries::get_intent_by_id(&db, "pi_test_0").unwrap().unwrap();
    assert_eq!(intent.status, IntentStatus::Failed);
}

// ── Webhook Signatures ──

fn sign_payload(secret: &str, timestamp: &str, payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn test_webhook_signature_enforced_when_configured() {
    let h = harness_with_secret("whsec_test");
    let app = test_app(h.state);

    let payload = succeeded_event("pi_unknown", 60000).to_string();

    // No signature header.
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/stripe")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Valid signature.
    let sig = sign_payload("whsec_test", "1700000000", &payload);
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/stripe")
                .header("Content-Type", "application/json")
                .header("Stripe-Signature", format!("t=1700000000,v1={sig}"))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Client Confirmation ──

#[tokio::test]
async fn test_peer_payment_confirmation_flow() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    let res = app
        .clone()
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "venmo"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(json_request(
            "/api/payment-confirmation",
            serde_json::json!({"bookingId": id, "paymentMethod": "venmo", "amount": total}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["newlyPaid"], true);
    assert_eq!(body["booking"]["status"], "paid");
    assert_eq!(body["booking"]["paymentMethod"], "venmo");
    assert_eq!(body["emailSent"], true);

    // Duplicate confirmation: same stored state back, nothing re-applied.
    let res = app
        .oneshot(json_request(
            "/api/payment-confirmation",
            serde_json::json!({"bookingId": id, "paymentMethod": "venmo", "amount": total}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["newlyPaid"], false);
    assert_eq!(body["booking"]["status"], "paid");

    assert_eq!(h.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_confirmation_on_unrouted_booking_rejected() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    let res = app
        .oneshot(json_request(
            "/api/payment-confirmation",
            serde_json::json!({"bookingId": id, "paymentMethod": "venmo", "amount": total}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_confirmation_unknown_booking_404() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(json_request(
            "/api/payment-confirmation",
            serde_json::json!({"bookingId": "missing", "paymentMethod": "venmo", "amount": 1000}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_failure_does_not_block_paid_state() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, total) = create_booking(&app).await;
    let res = app
        .clone()
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "cashapp"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    h.mailer_fail.store(true, Ordering::SeqCst);

    let res = app
        .oneshot(json_request(
            "/api/payment-confirmation",
            serde_json::json!({"bookingId": id, "paymentMethod": "cashapp", "amount": total}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["emailSent"], false);
    assert!(body["emailWarning"]
        .as_str()
        .unwrap()
        .contains("saved your booking"));

    let db = h.state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
    assert!(!booking.confirmation_email_sent);
}

// ── Admin API ──

#[tokio::test]
async fn test_admin_bookings_requires_auth() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_bookings_listing_with_filter() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let (id, _) = create_booking(&app).await;
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings?status=pending")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], id);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings?status=paid")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(res).await;
    assert!(body.as_array().unwrap().is_empty());
}

// ── Reminders ──

#[tokio::test]
async fn test_reminder_sweep_sends_once() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    // Paid booking exactly fourteen days out.
    let mut payload = booking_payload();
    let event_date = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(14))
        .unwrap();
    payload["eventDate"] = serde_json::json!(event_date.to_string());
    let res = app
        .clone()
        .oneshot(json_request("/api/bookings", payload))
        .await
        .unwrap();
    let id = response_json(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(json_request(
            &format!("/api/bookings/{id}/pay"),
            serde_json::json!({"paymentMethod": "venmo"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .oneshot(json_request(
            "/api/payment-confirmation",
            serde_json::json!({"bookingId": id, "paymentMethod": "venmo"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let baseline = h.sent.lock().unwrap().len();

    assert_eq!(reminders::sweep(&h.state).await.unwrap(), 1);
    {
        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), baseline + 1);
        assert!(sent
            .last()
            .unwrap()
            .subject
            .to_lowercase()
            .contains("two weeks"));
    }

    // Flag set: the next sweep finds nothing.
    assert_eq!(reminders::sweep(&h.state).await.unwrap(), 0);
}
