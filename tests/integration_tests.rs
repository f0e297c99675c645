use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Local;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventbook::config::{default_reminder_time, AppConfig};
use eventbook::db::{self, queries};
use eventbook::handlers;
use eventbook::models::BookingStatus;
use eventbook::services::messaging::brevo::BrevoEmailProvider;
use eventbook::services::messaging::fast2sms::Fast2SmsProvider;
use eventbook::services::messaging::{EmailProvider, MessagingProvider, OutgoingEmail};
use eventbook::services::notify::{
    ChannelKind, DeliveryOutcome, DeliveryReport, EmailChannel, Notifier, SmsChannel,
    WhatsAppChannel,
};
use eventbook::state::AppState;

// ── Mock Providers ──

#[derive(Clone, Default)]
struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockEmail {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

#[async_trait]
impl EmailProvider for MockEmail {
    async fn send_email(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ── Helpers ──

const BUSINESS: &str = "Test Events";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        secret_key: "test-secret".to_string(),
        admin_user: "admin".to_string(),
        admin_pass: "s3cret".to_string(),
        admin_email: Some("admin@example.com".to_string()),
        admin_whatsapp: None,
        business_name: BUSINESS.to_string(),
        brevo_api_key: None,
        fast2sms_api_key: None,
        whatsapp_instance_id: None,
        whatsapp_token: None,
        country_code: "91".to_string(),
        reminder_at: default_reminder_time(),
        notify_timeout_secs: 5,
        session_ttl_hours: 12,
    }
}

fn link_only() -> WhatsAppChannel {
    WhatsAppChannel::new(None, None, "91".to_string(), BUSINESS.to_string())
}

fn state_with(
    email: Option<EmailChannel>,
    whatsapp: WhatsAppChannel,
    sms: Option<SmsChannel>,
) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    let db: db::Db = Arc::new(Mutex::new(conn));
    let notifier = Arc::new(Notifier::new(Arc::clone(&db), email, whatsapp, sms));
    Arc::new(AppState::new(db, test_config(), notifier))
}

/// Only the WhatsApp link channel is active.
fn test_state() -> Arc<AppState> {
    state_with(None, link_only(), None)
}

struct Recorders {
    email: MockEmail,
    whatsapp: MockMessaging,
    sms: MockMessaging,
}

/// Every channel active and backed by an in-memory recorder.
fn test_state_with_sent() -> (Arc<AppState>, Recorders) {
    let recorders = Recorders {
        email: MockEmail::default(),
        whatsapp: MockMessaging::default(),
        sms: MockMessaging::default(),
    };
    let state = state_with(
        Some(EmailChannel::new(
            Box::new(recorders.email.clone()),
            "admin@example.com".to_string(),
            BUSINESS.to_string(),
        )),
        WhatsAppChannel::new(
            Some(Box::new(recorders.whatsapp.clone())),
            None,
            "91".to_string(),
            BUSINESS.to_string(),
        ),
        Some(SmsChannel::new(
            Box::new(recorders.sms.clone()),
            "91".to_string(),
            BUSINESS.to_string(),
        )),
    );
    (state, recorders)
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn booking_json(name: &str, event_date: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "location": "Chennai",
        "phone": "9000000000",
        "customer_email": "asha@example.com",
        "event_date": event_date,
        "service": "Catering",
        "extras": ["Lighting", "Music"],
        "notes": "Vegetarian menu",
    })
}

async fn body_json(res: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn submit(state: &Arc<AppState>, payload: serde_json::Value) -> Response {
    test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn create(state: &Arc<AppState>, name: &str, event_date: &str) -> i64 {
    let res = submit(state, booking_json(name, event_date)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["id"].as_i64().unwrap()
}

/// Logs in with the test credentials and returns the `Cookie` header value.
async fn login_cookie(state: &Arc<AppState>) -> String {
    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/login")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=s3cret"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn admin_request(
    state: &Arc<AppState>,
    cookie: &str,
    method: &str,
    uri: &str,
) -> Response {
    test_app(state.clone())
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Collects the next `n` delivery reports, failing the test after a few seconds.
async fn next_reports(
    rx: &mut tokio::sync::broadcast::Receiver<DeliveryReport>,
    n: usize,
) -> Vec<DeliveryReport> {
    let mut reports = vec![];
    while reports.len() < n {
        let report = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for delivery report")
            .unwrap();
        reports.push(report);
    }
    reports
}

fn outcome(reports: &[DeliveryReport], kind: ChannelKind) -> DeliveryOutcome {
    reports
        .iter()
        .find(|r| r.channel == kind)
        .map(|r| r.outcome.clone())
        .unwrap()
}

// ── Public Booking Tests ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");
}

#[tokio::test]
async fn test_valid_booking_created_pending() {
    let state = test_state();

    let res = submit(&state, booking_json("Asha", "2025-12-01")).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["status"], "Pending");
    assert!(json["whatsapp_link"]
        .as_str()
        .unwrap()
        .starts_with("https://wa.me/919000000000?text="));
    assert!(json["whatsapp_qr"].as_str().unwrap().contains("<svg"));

    let id = json["id"].as_i64().unwrap();
    let booking = queries::get_booking_by_id(&state.db.lock().unwrap(), id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.extras, "Lighting, Music");
    assert_eq!(booking.notes.as_deref(), Some("Vegetarian menu"));
}

#[tokio::test]
async fn test_public_booking_lookup() {
    let state = test_state();
    let id = create(&state, "Asha", "2025-12-01").await;

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["name"], "Asha");
    assert_eq!(json["event_date"], "2025-12-01");
    assert!(json.get("phone").is_none());

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/bookings/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_field_rejected_without_insert() {
    let state = test_state();

    let mut payload = booking_json("Asha", "2025-12-01");
    payload["location"] = serde_json::json!("   ");
    let res = submit(&state, payload).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["field"], "location");

    let res = submit(&state, booking_json("Asha", "01/12/2025")).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["field"], "event_date");

    let mut payload = booking_json("Asha", "2025-12-01");
    payload["service"] = serde_json::json!("Fireworks");
    let res = submit(&state, payload).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["field"], "service");

    let rows = queries::list_bookings(&state.db.lock().unwrap(), None).unwrap();
    assert!(rows.is_empty());
}

// ── Admin Gate Tests ──

#[tokio::test]
async fn test_admin_requires_session() {
    let state = test_state();
    let id = create(&state, "Asha", "2025-12-01").await;

    for (method, uri) in [
        ("GET", "/admin".to_string()),
        ("GET", "/api/admin/bookings".to_string()),
        ("POST", format!("/api/admin/bookings/{id}/confirm")),
        ("DELETE", format!("/api/admin/bookings/{id}")),
        ("GET", "/api/admin/export.csv".to_string()),
    ] {
        let res = test_app(state.clone())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(&uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{method} {uri}");
        assert_eq!(res.headers()[header::LOCATION], "/admin/login");
    }

    let booking = queries::get_booking_by_id(&state.db.lock().unwrap(), id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_forged_cookie_rejected() {
    let state = test_state();
    let res = admin_request(
        &state,
        "eventbook_session=00000000-0000-0000-0000-000000000000.AAAA",
        "GET",
        "/api/admin/bookings",
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_failure() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/login")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_and_logout() {
    let state = test_state();
    let cookie = login_cookie(&state).await;

    let res = admin_request(&state, &cookie, "GET", "/admin").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = admin_request(&state, &cookie, "POST", "/admin/logout").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/admin/login");

    let res = admin_request(&state, &cookie, "GET", "/api/admin/bookings").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

fn otp_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/admin/otp")
        .body(Body::empty())
        .unwrap()
}

fn otp_verify(code: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/admin/otp/verify")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("code={code}")))
        .unwrap()
}

/// Pulls the six-digit code out of the last email sent to the admin.
fn last_emailed_code(email: &MockEmail) -> String {
    let html = email.sent.lock().unwrap().last().unwrap().html.clone();
    html.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_digit()))
        .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_otp_unavailable_without_channels() {
    let state = test_state();
    let res = test_app(state.clone()).oneshot(otp_request()).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Nothing was left outstanding for anyone to guess.
    assert!(state.otp.issue().is_ok());
}

#[tokio::test]
async fn test_otp_reissue_keeps_attempt_budget() {
    let (state, sent) = test_state_with_sent();

    let res = test_app(state.clone()).oneshot(otp_request()).await.unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let code = last_emailed_code(&sent.email);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..4 {
        let res = test_app(state.clone()).oneshot(otp_verify(wrong)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // A live code cannot be replaced by asking again.
    let res = test_app(state.clone()).oneshot(otp_request()).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(sent.email.sent.lock().unwrap().len(), 1);

    let res = test_app(state.clone()).oneshot(otp_verify(wrong)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Budget spent: even the right code is refused and no new code is issued.
    let res = test_app(state.clone()).oneshot(otp_verify(&code)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = test_app(state).oneshot(otp_request()).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_otp_login_via_email() {
    let (state, sent) = test_state_with_sent();

    let res = test_app(state.clone()).oneshot(otp_request()).await.unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    // No admin phone configured, so the code goes out by email.
    let code = last_emailed_code(&sent.email);

    let res = test_app(state.clone()).oneshot(otp_verify(&code)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(res.headers().get(header::SET_COOKIE).is_some());

    // Single use.
    let res = test_app(state).oneshot(otp_verify(&code)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// ── Status Transition Tests ──

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let (state, sent) = test_state_with_sent();
    let mut rx = state.notifier.subscribe();
    let id = create(&state, "Asha", "2025-12-01").await;
    next_reports(&mut rx, 3).await;
    let cookie = login_cookie(&state).await;

    let uri = format!("/api/admin/bookings/{id}/confirm");
    let res = admin_request(&state, &cookie, "POST", &uri).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Confirmed");
    next_reports(&mut rx, 3).await;
    let sms_after_first = sent.sms.sent.lock().unwrap().len();

    let res = admin_request(&state, &cookie, "POST", &uri).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Confirmed");

    // A repeated confirm must not fan out again.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(sent.sms.sent.lock().unwrap().len(), sms_after_first);

    let res = admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{id}/reject")).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_transition_missing_booking() {
    let state = test_state();
    let cookie = login_cookie(&state).await;

    for action in ["confirm", "reject", "resend", "receipt"] {
        let method = if action == "receipt" { "GET" } else { "POST" };
        let res = admin_request(
            &state,
            &cookie,
            method,
            &format!("/api/admin/bookings/999/{action}"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{action}");
    }

    let res = admin_request(&state, &cookie, "DELETE", "/api/admin/bookings/999").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_confirm_notifies_customer() {
    let (state, sent) = test_state_with_sent();
    let mut rx = state.notifier.subscribe();
    let id = create(&state, "Asha", "2025-12-01").await;
    next_reports(&mut rx, 3).await;
    let cookie = login_cookie(&state).await;

    let res = admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{id}/confirm")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let reports = next_reports(&mut rx, 3).await;
    assert!(reports.iter().all(|r| r.outcome == DeliveryOutcome::Delivered));

    let emails = sent.email.sent.lock().unwrap().clone();
    let confirmed = emails.last().unwrap();
    assert_eq!(confirmed.to, vec!["asha@example.com".to_string()]);
    assert_eq!(confirmed.bcc, vec!["admin@example.com".to_string()]);
    assert!(confirmed.subject.contains("Confirmed"));
    assert_eq!(
        confirmed.attachment.as_ref().unwrap().name,
        format!("Booking_{id}.pdf")
    );

    let wa = sent.whatsapp.sent.lock().unwrap().clone();
    assert_eq!(wa.last().unwrap().0, "919000000000");
    assert!(wa.last().unwrap().1.contains("Confirmed"));

    let sms = sent.sms.sent.lock().unwrap().clone();
    assert_eq!(sms.last().unwrap().0, "9000000000");

    let booking = queries::get_booking_by_id(&state.db.lock().unwrap(), id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(booking.email_sent);
    assert!(booking.whatsapp_sent);
}

#[tokio::test]
async fn test_failed_channel_leaves_booking_intact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .and(header_eq("api-key", "brevo-key"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dev/bulkV2"))
        .and(header_eq("authorization", "sms-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"return": true})))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let state = state_with(
        Some(EmailChannel::new(
            Box::new(
                BrevoEmailProvider::new(
                    client.clone(),
                    "brevo-key".to_string(),
                    BUSINESS.to_string(),
                    "admin@example.com".to_string(),
                )
                .with_base_url(server.uri()),
            ),
            "admin@example.com".to_string(),
            BUSINESS.to_string(),
        )),
        link_only(),
        Some(SmsChannel::new(
            Box::new(Fast2SmsProvider::new(client, "sms-key".to_string()).with_base_url(server.uri())),
            "91".to_string(),
            BUSINESS.to_string(),
        )),
    );
    let mut rx = state.notifier.subscribe();

    let id = create(&state, "Asha", "2025-12-01").await;
    let reports = next_reports(&mut rx, 3).await;
    assert!(matches!(outcome(&reports, ChannelKind::Email), DeliveryOutcome::Failed(_)));
    assert_eq!(outcome(&reports, ChannelKind::Sms), DeliveryOutcome::Delivered);
    assert_eq!(outcome(&reports, ChannelKind::WhatsApp), DeliveryOutcome::Delivered);

    let cookie = login_cookie(&state).await;
    let res = admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{id}/confirm")).await;
    assert_eq!(res.status(), StatusCode::OK);
    next_reports(&mut rx, 3).await;

    let booking = queries::get_booking_by_id(&state.db.lock().unwrap(), id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(!booking.email_sent);
    assert!(booking.whatsapp_sent);
}

#[tokio::test]
async fn test_resend_reruns_current_event() {
    let (state, sent) = test_state_with_sent();
    let mut rx = state.notifier.subscribe();
    let id = create(&state, "Asha", "2025-12-01").await;
    next_reports(&mut rx, 3).await;
    let cookie = login_cookie(&state).await;

    let res = admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{id}/reject")).await;
    assert_eq!(res.status(), StatusCode::OK);
    next_reports(&mut rx, 3).await;

    let res = admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{id}/resend")).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(res).await["event"], "rejected");

    let reports = next_reports(&mut rx, 3).await;
    assert!(reports.iter().all(|r| r.event == eventbook::models::BookingEvent::Rejected));
    assert!(sent.email.sent.lock().unwrap().last().unwrap().subject.contains("Rejected"));
}

// ── Listing, Export, Receipt ──

#[tokio::test]
async fn test_list_filters_by_status() {
    let state = test_state();
    let first = create(&state, "Asha", "2025-12-01").await;
    create(&state, "Ravi", "2025-12-02").await;
    let cookie = login_cookie(&state).await;

    admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{first}/confirm")).await;

    let res = admin_request(&state, &cookie, "GET", "/api/admin/bookings?status=confirmed").await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Asha");

    let res = admin_request(&state, &cookie, "GET", "/api/admin/bookings").await;
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 2);

    let res = admin_request(&state, &cookie, "GET", "/api/admin/bookings?status=archived").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_csv_export_newest_first() {
    let state = test_state();
    let first = create(&state, "Asha", "2025-12-01").await;
    let second = create(&state, "Ravi", "2025-12-02").await;
    let cookie = login_cookie(&state).await;

    let res = admin_request(&state, &cookie, "GET", "/api/admin/export.csv").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,name,location,phone"));
    assert!(lines[1].starts_with(&format!("{second},Ravi,")));
    assert!(lines[2].starts_with(&format!("{first},Asha,")));
    assert!(lines[2].contains("\"Lighting, Music\""));
}

#[tokio::test]
async fn test_receipt_pdf() {
    let state = test_state();
    let id = create(&state, "Asha", "2025-12-01").await;
    let cookie = login_cookie(&state).await;

    let res = admin_request(&state, &cookie, "GET", &format!("/api/admin/bookings/{id}/receipt")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");

    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_delete_booking() {
    let state = test_state();
    let id = create(&state, "Asha", "2025-12-01").await;
    let cookie = login_cookie(&state).await;

    let res = admin_request(&state, &cookie, "DELETE", &format!("/api/admin/bookings/{id}")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(queries::get_booking_by_id(&state.db.lock().unwrap(), id)
        .unwrap()
        .is_none());
}

// ── Reminders ──

#[tokio::test]
async fn test_reminder_endpoint_runs_once() {
    let (state, sent) = test_state_with_sent();
    let mut rx = state.notifier.subscribe();
    let tomorrow = Local::now().date_naive().succ_opt().unwrap();
    let id = create(&state, "Asha", &tomorrow.format("%Y-%m-%d").to_string()).await;
    let pending = create(&state, "Ravi", &tomorrow.format("%Y-%m-%d").to_string()).await;
    next_reports(&mut rx, 6).await;
    let cookie = login_cookie(&state).await;

    admin_request(&state, &cookie, "POST", &format!("/api/admin/bookings/{id}/confirm")).await;
    next_reports(&mut rx, 3).await;

    let res = admin_request(&state, &cookie, "POST", "/api/admin/reminders/run").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["processed"], 1);
    assert!(sent
        .whatsapp
        .sent
        .lock()
        .unwrap()
        .last()
        .unwrap()
        .1
        .contains("Event Reminder - Tomorrow"));

    let res = admin_request(&state, &cookie, "POST", "/api/admin/reminders/run").await;
    assert_eq!(body_json(res).await["processed"], 0);

    let conn = state.db.lock().unwrap();
    assert!(queries::get_booking_by_id(&conn, id).unwrap().unwrap().reminder_sent);
    assert!(!queries::get_booking_by_id(&conn, pending).unwrap().unwrap().reminder_sent);
}
