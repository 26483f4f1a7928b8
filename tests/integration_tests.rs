use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;

use bergerie::config::AppConfig;
use bergerie::db;
use bergerie::models::BookingStatus;
use bergerie::router;
use bergerie::services::contract_token;
use bergerie::services::mailer::{Mailer, OutboundEmail};
use bergerie::services::otp::OtpAuthenticator;
use bergerie::services::signing::{LinkSigner, ModerationAction};
use bergerie::state::AppState;

const SECRET: &str = "integration-test-secret";

// ── Mock mailer ──

struct MockMailer {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        site_url: "http://localhost:3000".to_string(),
        signing_secret: SECRET.to_string(),
        resend_api_key: "".to_string(),
        mail_from: "test@example.com".to_string(),
        notify_email: "host@example.com".to_string(),
        reply_to: None,
        property_name: "La Bergerie".to_string(),
        host_name: "Coralie".to_string(),
        bank_holder: "C. Durand".to_string(),
        bank_iban: "FR76 0000 0000 0000 0000 0000 000".to_string(),
        bank_bic: "ABCDEFGH".to_string(),
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<OutboundEmail>>>) {
    let conn = db::init_db(":memory:").unwrap();
    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        mailer: Box::new(MockMailer {
            sent: Arc::clone(&sent),
        }),
    });
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    router(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn submission_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Jeanne Martin",
        "email": "jeanne@example.com",
        "phone": "0601020304",
        "start_date": "2025-08-10",
        "end_date": "2025-08-13",
        "adults": 2,
        "children": 0,
        "animals_count": 1,
        "animal_type": "chien",
    })
}

/// Submits a booking through the API and returns its id.
async fn submit_booking(app: &Router) -> String {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/booking-request", submission_body()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["ok"], true);
    json["id"].as_str().unwrap().to_string()
}

fn moderation_uri(id: &str, action: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    let normalized = ModerationAction::normalize(action).unwrap();
    let sig = LinkSigner::new(SECRET).sign(id, normalized, exp);
    format!("/api/moderate?id={id}&action={action}&exp={exp}&sig={sig}")
}

async fn accept_booking(app: &Router, id: &str) {
    let res = app
        .clone()
        .oneshot(get_request(&moderation_uri(id, "accepted")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/booking/accepted");
}

fn token_for(id: &str) -> String {
    contract_token::create(SECRET, id, "jeanne@example.com").unwrap()
}

fn contract_body(id: &str, action: &str, otp_code: &str) -> serde_json::Value {
    serde_json::json!({
        "action": action,
        "rid": id,
        "t": token_for(id),
        "signer_address_line1": "1 rue des Pins",
        "signer_postal_code": "40000",
        "signer_city": "Mont-de-Marsan",
        "signer_country": "France",
        "contract_date": "01/08/2025",
        "occupants": [
            { "first_name": "Jeanne", "last_name": "Martin", "age": "34" },
            { "first_name": "Paul", "last_name": "Martin", "age": "36" },
        ],
        "accepted_terms": true,
        "otp_code": otp_code,
    })
}

fn current_otp(id: &str) -> String {
    OtpAuthenticator::new(SECRET).current_code(id, "jeanne@example.com", Utc::now().timestamp())
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let res = test_app(state).oneshot(get_request("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Submission ──

#[tokio::test]
async fn test_submission_prices_server_side_and_notifies() {
    let (state, sent) = test_state();
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/booking-request", submission_body()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    // 3 August nights (1500) + cleaning 100 + dog 30 + tourist tax 23.58.
    assert_eq!(json["pricing"]["total"], 1653.58);
    assert_eq!(json["pricing"]["base_accommodation"], 1500.0);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "host@example.com");
    assert!(sent[0].text.contains("/api/moderate?id="));
    assert!(sent[0].text.contains("action=accepted"));
    assert!(sent[0].text.contains("action=refused"));
    assert_eq!(sent[1].to, "jeanne@example.com");
    assert!(sent[1].text.contains("1653.58"));
}

#[tokio::test]
async fn test_submission_rejects_invalid_input() {
    let (state, sent) = test_state();
    let app = test_app(state);

    let mut body = submission_body();
    body["adults"] = serde_json::json!(0);
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/booking-request", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut body = submission_body();
    body["end_date"] = serde_json::json!("2025-08-10");
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/booking-request", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut body = submission_body();
    body["email"] = serde_json::json!("not-an-email");
    let res = app
        .oneshot(json_request("POST", "/api/booking-request", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(sent.lock().unwrap().is_empty());
}

// ── Moderation ──

#[tokio::test]
async fn test_accept_notifies_guest_once() {
    let (state, sent) = test_state();
    let app = test_app(Arc::clone(&state));
    let id = submit_booking(&app).await;
    sent.lock().unwrap().clear();

    accept_booking(&app, &id).await;

    {
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jeanne@example.com");
        assert!(sent[0].text.contains("/contract?rid="));
    }

    // Replaying the link changes nothing and sends nothing.
    let res = test_app(Arc::clone(&state))
        .oneshot(get_request(&moderation_uri(&id, "accepted")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/booking/accepted");
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_refuse_after_accept_is_a_noop() {
    let (state, sent) = test_state();
    let app = test_app(Arc::clone(&state));
    let id = submit_booking(&app).await;
    accept_booking(&app, &id).await;
    sent.lock().unwrap().clear();

    let res = app
        .clone()
        .oneshot(get_request(&moderation_uri(&id, "refused")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    // The page reflects the recorded status, not the attempted action.
    assert_eq!(res.headers()["location"], "/booking/accepted");
    assert!(sent.lock().unwrap().is_empty());

    let conn = state.db.lock().unwrap();
    let booking = bergerie::db::queries::get_booking_request(&conn, &id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Accepted);
}

#[tokio::test]
async fn test_legacy_action_spellings_accepted() {
    let (state, _) = test_state();
    let app = test_app(state);
    let id = submit_booking(&app).await;

    let res = app
        .oneshot(get_request(&moderation_uri(&id, "reject")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/booking/refused");
}

#[tokio::test]
async fn test_invalid_link_fails_safe_to_refusal_page() {
    let (state, sent) = test_state();
    let app = test_app(Arc::clone(&state));
    let id = submit_booking(&app).await;
    sent.lock().unwrap().clear();

    // Tampered signature.
    let exp = Utc::now().timestamp() + 3600;
    let uri = format!("/api/moderate?id={id}&action=accepted&exp={exp}&sig=deadbeef");
    let res = app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/booking/refused");

    // Missing parameters.
    let res = app
        .clone()
        .oneshot(get_request("/api/moderate?id=&action=&exp=&sig="))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/booking/refused");

    // The booking itself stays pending and no email left.
    let conn = state.db.lock().unwrap();
    let booking = bergerie::db::queries::get_booking_request(&conn, &id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(sent.lock().unwrap().is_empty());
}

// ── Contract ──

#[tokio::test]
async fn test_contract_view_requires_valid_token() {
    let (state, _) = test_state();
    let app = test_app(state);
    let id = submit_booking(&app).await;

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/contract?rid={id}&t={}",
            token_for(&id)
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["booking"]["deposit30"], 496.07);
    assert_eq!(json["booking"]["occupant_cap"], 2);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/api/contract?rid={id}&t=wrong")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(get_request("/api/contract?rid=&t="))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(get_request(&format!(
            "/api/contract?rid=unknown-id&t={}",
            token_for("unknown-id")
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_otp_requires_accepted_booking() {
    let (state, _) = test_state();
    let app = test_app(state);
    let id = submit_booking(&app).await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/contract",
            contract_body(&id, "send_otp", ""),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_signature_flow() {
    let (state, sent) = test_state();
    let app = test_app(Arc::clone(&state));
    let id = submit_booking(&app).await;
    accept_booking(&app, &id).await;
    sent.lock().unwrap().clear();

    // Request the signature code with the completed form; the code goes to
    // the on-file address.
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/contract",
            contract_body(&id, "send_otp", ""),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["otp_sent"], true);
    {
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jeanne@example.com");
        assert!(sent[0].text.contains(&current_otp(&id)));
    }
    sent.lock().unwrap().clear();

    // A wrong code does not sign.
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/contract",
            contract_body(&id, "verify_otp", "000000"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The right code signs and reports the deposit.
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/contract",
            contract_body(&id, "verify_otp", &current_otp(&id)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["signed"], true);
    assert_eq!(json["deposit30"], 496.07);

    {
        let sent = sent.lock().unwrap();
        // Guest confirmation with the bank details, then the host notice.
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "jeanne@example.com");
        assert!(sent[0].text.contains("496.07"));
        assert!(sent[0].text.contains("IBAN"));
        assert!(sent[0].text.contains("RÈGLEMENT INTÉRIEUR"));
        assert_eq!(sent[1].to, "host@example.com");
    }
    sent.lock().unwrap().clear();

    // Signing again is rejected, the contract is frozen.
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/contract",
            contract_body(&id, "verify_otp", &current_otp(&id)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Declaring the transfer notifies the host once.
    for expected_mails in [1, 1] {
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/contract",
                serde_json::json!({ "action": "transfer_sent", "rid": id, "t": token_for(&id) }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(sent.lock().unwrap().len(), expected_mails);
    }
}

#[tokio::test]
async fn test_contract_validation_messages() {
    let (state, _) = test_state();
    let app = test_app(state);
    let id = submit_booking(&app).await;
    accept_booking(&app, &id).await;

    // Too many occupants for 2 travellers blocks even code issuance.
    let mut body = contract_body(&id, "send_otp", "");
    body["occupants"] = serde_json::json!([
        { "first_name": "A", "last_name": "B", "age": "1" },
        { "first_name": "C", "last_name": "D", "age": "2" },
        { "first_name": "E", "last_name": "F", "age": "3" },
    ]);
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/contract", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("occupants"));

    // Terms must be accepted.
    let mut body = contract_body(&id, "verify_otp", &current_otp(&id));
    body["accepted_terms"] = serde_json::json!(false);
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/contract", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Impossible contract date.
    let mut body = contract_body(&id, "verify_otp", &current_otp(&id));
    body["contract_date"] = serde_json::json!("31/02/2025");
    let res = app
        .oneshot(json_request("POST", "/api/contract", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transfer_requires_signed_contract() {
    let (state, _) = test_state();
    let app = test_app(state);
    let id = submit_booking(&app).await;
    accept_booking(&app, &id).await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/contract",
            serde_json::json!({ "action": "transfer_sent", "rid": id, "t": token_for(&id) }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Reviews ──

fn review_moderation_uri(id: &str, action: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    let normalized = ModerationAction::normalize(action).unwrap();
    let sig = LinkSigner::new(SECRET).sign(id, normalized, exp);
    format!("/api/reviews/moderate?id={id}&action={action}&exp={exp}&sig={sig}")
}

#[tokio::test]
async fn test_review_flow() {
    let (state, sent) = test_state();
    let app = test_app(Arc::clone(&state));

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            serde_json::json!({ "name": "Paul", "rating": 5, "comment": "Séjour parfait." }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let id = json["id"].as_str().unwrap().to_string();

    {
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "host@example.com");
        assert!(sent[0].text.contains("/api/reviews/moderate?id="));
    }

    // Pending reviews are not public.
    let res = app.clone().oneshot(get_request("/api/reviews")).await.unwrap();
    let json = body_json(res).await;
    assert_eq!(json["reviews"].as_array().unwrap().len(), 0);

    // Approve, then check it is published exactly once even on replay.
    let res = app
        .clone()
        .oneshot(get_request(&review_moderation_uri(&id, "accepted")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/reviews/approved");

    let res = app
        .clone()
        .oneshot(get_request(&review_moderation_uri(&id, "accepted")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);

    let res = app.clone().oneshot(get_request("/api/reviews")).await.unwrap();
    let json = body_json(res).await;
    let reviews = json["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 5);
}

#[tokio::test]
async fn test_review_rejects_bad_rating() {
    let (state, _) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            serde_json::json!({ "name": "Paul", "rating": 6, "comment": "..." }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
