//! HTTP-level tests for the estate API.
//!
//! Each test builds its own router with the built-in catalog and an
//! in-process responder, then drives it with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;

use estate_intelligence::api::{create_router, ApiState};
use estate_intelligence::catalog::Catalog;
use estate_intelligence::concierge::{SessionRegistry, FALLBACK_REPLY, GREETING};
use estate_intelligence::{Conversation, EstateError, Persona, Responder, Result};

// =============================================================================
// Helpers
// =============================================================================

/// Replies with "echo: <text>".
struct EchoResponder;

struct EchoConversation;

#[async_trait]
impl Responder for EchoResponder {
    async fn create_conversation(&self, _persona: &Persona) -> Result<Box<dyn Conversation>> {
        Ok(Box::new(EchoConversation))
    }
}

#[async_trait]
impl Conversation for EchoConversation {
    async fn turn(&mut self, text: &str) -> Result<Option<String>> {
        Ok(Some(format!("echo: {}", text)))
    }
}

/// Never manages to open a conversation.
struct OfflineResponder;

#[async_trait]
impl Responder for OfflineResponder {
    async fn create_conversation(&self, _persona: &Persona) -> Result<Box<dyn Conversation>> {
        Err(EstateError::Config("GEMINI_API_KEY not configured".into()))
    }
}

/// Holds every turn until released.
#[derive(Clone, Default)]
struct GatedResponder {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

struct GatedConversation(GatedResponder);

#[async_trait]
impl Responder for GatedResponder {
    async fn create_conversation(&self, _persona: &Persona) -> Result<Box<dyn Conversation>> {
        Ok(Box::new(GatedConversation(self.clone())))
    }
}

#[async_trait]
impl Conversation for GatedConversation {
    async fn turn(&mut self, _text: &str) -> Result<Option<String>> {
        self.0.started.notify_one();
        self.0.release.notified().await;
        Ok(Some("done".into()))
    }
}

fn make_app(responder: Arc<dyn Responder>) -> axum::Router {
    create_router(ApiState::new(Catalog::default(), SessionRegistry::new(responder)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Health & catalog
// =============================================================================

#[tokio::test]
async fn health_reports_healthy() {
    let (status, body) = send(make_app(Arc::new(EchoResponder)), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn catalog_lists_plots_and_years() {
    let (status, body) = send(make_app(Arc::new(EchoResponder)), get("/api/catalog")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["plots"].as_array().unwrap().len(), 3);
    assert_eq!(data["purchase_years"], json!([2026, 2027, 2028]));
    assert_eq!(data["home_currency"], "NGN");
    assert_eq!(data["horizon_year"], 2031);
}

#[tokio::test]
async fn masterplan_lists_hotspots() {
    let app = make_app(Arc::new(EchoResponder));
    let (status, body) = send(app.clone(), get("/api/masterplan")).await;
    assert_eq!(status, StatusCode::OK);

    let hotspots = body["data"]["hotspots"].as_array().unwrap();
    assert_eq!(hotspots.len(), 4);
    assert_eq!(hotspots[0]["id"], "gate");
    assert_eq!(hotspots[0]["x"], 50.0);
    assert_eq!(hotspots[1]["status"], "Selling Fast");

    let (_, catalog) = send(app, get("/api/catalog")).await;
    assert_eq!(catalog["data"]["hotspots"], body["data"]["hotspots"]);
}

#[tokio::test]
async fn masterplan_hotspot_by_id() {
    let app = make_app(Arc::new(EchoResponder));
    let (status, body) = send(app.clone(), get("/api/masterplan/school")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hotspot"]["title"], "International Academy");
    assert_eq!(body["data"]["accepts_enquiries"], false);

    let (status, _) = send(app, get("/api/masterplan/marina")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Projection
// =============================================================================

#[tokio::test]
async fn projection_for_catalog_plot() {
    let req = post_json(
        "/api/projection",
        json!({"plot_index": 2, "purchase_year": 2026, "currency": "NGN"}),
    );
    let (status, body) = send(make_app(Arc::new(EchoResponder)), req).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["series"].as_array().unwrap().len(), 6);
    assert_eq!(data["horizon_year"], 2031);
    let appreciation = data["total_appreciation_percent"].as_f64().unwrap();
    assert!((appreciation - 110.0).abs() < 1e-6);
}

#[tokio::test]
async fn projection_for_explicit_price_in_dollars() {
    let req = post_json(
        "/api/projection",
        json!({"base_price": 37000000.0, "purchase_year": 2028, "currency": "usd"}),
    );
    let (status, body) = send(make_app(Arc::new(EchoResponder)), req).await;

    assert_eq!(status, StatusCode::OK);
    let entry = body["data"]["entry_value"].as_f64().unwrap();
    assert!((entry - 31_218.75).abs() < 1e-6);
    assert_eq!(body["data"]["currency"], "USD");
}

#[tokio::test]
async fn projection_rejects_bad_input() {
    let cases = [
        (json!({"plot_index": 0, "purchase_year": 2026, "currency": "EUR"}), StatusCode::BAD_REQUEST),
        (json!({"plot_index": 0, "purchase_year": 2030, "currency": "NGN"}), StatusCode::BAD_REQUEST),
        (json!({"base_price": 0.0, "purchase_year": 2026, "currency": "NGN"}), StatusCode::BAD_REQUEST),
        (json!({"purchase_year": 2026, "currency": "NGN"}), StatusCode::BAD_REQUEST),
        (json!({"plot_index": 7, "purchase_year": 2026, "currency": "NGN"}), StatusCode::NOT_FOUND),
    ];

    for (payload, expected) in cases {
        let (status, body) = send(
            make_app(Arc::new(EchoResponder)),
            post_json("/api/projection", payload.clone()),
        )
        .await;
        assert_eq!(status, expected, "payload {}", payload);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn quote_prices_every_plot() {
    let req = post_json("/api/plots/quote", json!({"purchase_year": 2027, "currency": "GBP"}));
    let (status, body) = send(make_app(Arc::new(EchoResponder)), req).await;

    assert_eq!(status, StatusCode::OK);
    let quotes = body["data"].as_array().unwrap();
    assert_eq!(quotes.len(), 3);
    let starter = quotes[0]["price"].as_f64().unwrap();
    assert!((starter - 37_000_000.0 * 1.15 * 0.00049).abs() < 1e-6);
}

// =============================================================================
// Concierge
// =============================================================================

#[tokio::test]
async fn chat_relays_reply_and_keeps_transcript() {
    let app = make_app(Arc::new(EchoResponder));

    let (status, body) = send(
        app.clone(),
        post_json("/api/concierge/chat", json!({"chat_id": "visitor-1", "message": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reply"], "echo: Hello");
    assert_eq!(body["data"]["transcript_len"], 3);

    let chat_id = body["data"]["chat_id"].as_str().unwrap().to_string();
    let (status, body) = send(app, get(&format!("/api/concierge/{}/transcript", chat_id))).await;
    assert_eq!(status, StatusCode::OK);

    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages[0]["text"], GREETING);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[2]["text"], "echo: Hello");
    assert_eq!(body["data"]["state"], "active");
}

#[tokio::test]
async fn chat_falls_back_when_responder_is_offline() {
    let app = make_app(Arc::new(OfflineResponder));

    for _ in 0..2 {
        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/concierge/chat",
                json!({"chat_id": "visitor-2", "message": "Tell me about pricing"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reply"], FALLBACK_REPLY);
    }
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let (status, body) = send(
        make_app(Arc::new(EchoResponder)),
        post_json("/api/concierge/chat", json!({"message": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn blank_messages_never_open_sessions() {
    let state = ApiState::new(Catalog::default(), SessionRegistry::new(Arc::new(EchoResponder)));
    let app = create_router(state.clone());

    for i in 0..50 {
        let (status, _) = send(
            app.clone(),
            post_json(
                "/api/concierge/chat",
                json!({"chat_id": format!("visitor-{}", i), "message": " \n "}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn session_count_stays_within_registry_bound() {
    let registry = SessionRegistry::with_max_sessions(Arc::new(EchoResponder), 3);
    let state = ApiState::new(Catalog::default(), registry);
    let app = create_router(state.clone());

    for i in 0..10 {
        let (status, _) = send(
            app.clone(),
            post_json(
                "/api/concierge/chat",
                json!({"chat_id": format!("visitor-{}", i), "message": "hello"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(state.sessions.len().await, 3);
    let (status, _) = send(app.clone(), get("/api/concierge/visitor-0/transcript")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app, get("/api/concierge/visitor-9/transcript")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn overlapping_send_is_refused() {
    let responder = GatedResponder::default();
    let app = make_app(Arc::new(responder.clone()));

    let first = tokio::spawn(send(
        app.clone(),
        post_json("/api/concierge/chat", json!({"chat_id": "visitor-3", "message": "first"})),
    ));
    responder.started.notified().await;

    let (status, _) = send(
        app.clone(),
        post_json("/api/concierge/chat", json!({"chat_id": "visitor-3", "message": "second"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    responder.release.notify_one();
    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reply"], "done");
}

#[tokio::test]
async fn unknown_transcript_is_not_found() {
    let (status, _) = send(
        make_app(Arc::new(EchoResponder)),
        get("/api/concierge/nobody/transcript"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
