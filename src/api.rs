//! REST API Server for the estate site
//!
//! Exposes the projection engine and the concierge relay over HTTP
//! for the marketing frontend.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::concierge::session::resolve_chat_id;
use crate::concierge::SessionRegistry;
use crate::error::EstateError;
use crate::models::{Currency, Projection};
use crate::projection::ProjectionEngine;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectionRequest {
    pub plot_index: Option<usize>,
    pub base_price: Option<f64>,
    pub purchase_year: i32,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteRequest {
    pub purchase_year: i32,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub chat_id: Option<String>,
    pub message: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn failure(error: EstateError) -> ApiResult {
    let status = match &error {
        EstateError::PlotNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_caller_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }

    (status, Json(ApiResponse::error(error.to_string())))
}

fn busy() -> ApiResult {
    (
        StatusCode::CONFLICT,
        Json(ApiResponse::error(
            "The concierge is still answering your previous message".to_string(),
        )),
    )
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<Catalog>,
    pub engine: Arc<ProjectionEngine>,
    pub sessions: Arc<SessionRegistry>,
}

impl ApiState {
    pub fn new(catalog: Catalog, sessions: SessionRegistry) -> Self {
        let engine = ProjectionEngine::from_catalog(&catalog);
        Self {
            catalog: Arc::new(catalog),
            engine: Arc::new(engine),
            sessions: Arc::new(sessions),
        }
    }

    /// Validate a purchase year against the catalog's supported entry years
    fn supported_year(&self, year: i32) -> crate::Result<i32> {
        if self.catalog.is_supported_purchase_year(year) {
            Ok(year)
        } else {
            Err(EstateError::UnsupportedPurchaseYear(year))
        }
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Catalog & Projection Endpoints
/// =============================

async fn catalog_handler(State(state): State<ApiState>) -> ApiResult {
    let catalog = &state.catalog;
    let currencies: Vec<Currency> = catalog.currency_rates.currencies().collect();

    ok(serde_json::json!({
        "plots": catalog.plots,
        "purchase_years": catalog.purchase_years,
        "currencies": currencies,
        "home_currency": catalog.currency_rates.home_currency(),
        "baseline_year": catalog.growth_curve.baseline_year,
        "horizon_year": catalog.growth_curve.horizon_year(),
        "hotspots": catalog.hotspots,
    }))
}

async fn masterplan_handler(State(state): State<ApiState>) -> ApiResult {
    ok(serde_json::json!({ "hotspots": state.catalog.hotspots }))
}

async fn hotspot_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult {
    match state.catalog.hotspot(&id) {
        Some(spot) => ok(serde_json::json!({
            "hotspot": spot,
            "accepts_enquiries": spot.status.accepts_enquiries(),
        })),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("No masterplan hotspot {:?}", id))),
        ),
    }
}

async fn projection_handler(
    State(state): State<ApiState>,
    Json(req): Json<ProjectionRequest>,
) -> ApiResult {
    info!(
        "Projection request: plot={:?} price={:?} year={} currency={}",
        req.plot_index, req.base_price, req.purchase_year, req.currency
    );

    let result = run_projection(&state, &req);

    match result {
        Ok(projection) => ok(projection),
        Err(e) => failure(e),
    }
}

fn run_projection(state: &ApiState, req: &ProjectionRequest) -> crate::Result<Projection> {
    let currency: Currency = req.currency.parse()?;
    let year = state.supported_year(req.purchase_year)?;

    match (req.plot_index, req.base_price) {
        (Some(index), None) => state.engine.project_plot(&state.catalog, index, year, currency),
        (None, Some(price)) => state.engine.project(price, year, currency),
        _ => Err(EstateError::InvalidInput(
            "exactly one of plot_index or base_price is required".to_string(),
        )),
    }
}

async fn quote_handler(
    State(state): State<ApiState>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult {
    let result = req.currency.parse::<Currency>().and_then(|currency| {
        let year = state.supported_year(req.purchase_year)?;
        state.engine.quote_plots(&state.catalog, year, currency)
    });

    match result {
        Ok(quotes) => ok(quotes),
        Err(e) => failure(e),
    }
}

/// =============================
/// Concierge Endpoints
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult {
    // Blank messages never open a session.
    if req.message.trim().is_empty() {
        return failure(EstateError::InvalidInput(
            "message must not be empty".to_string(),
        ));
    }

    let chat_id = resolve_chat_id(req.chat_id.as_deref());
    let handle = state.sessions.get_or_create(chat_id).await;

    // One outstanding send per session; overlapping sends are refused.
    let Ok(mut session) = handle.try_lock() else {
        info!("chat_handler busy => chat_id={}", chat_id);
        return busy();
    };

    match session.send(&req.message).await {
        Ok(reply) => ok(serde_json::json!({
            "chat_id": chat_id.to_string(),
            "reply": reply,
            "transcript_len": session.transcript().len(),
        })),
        Err(e) => failure(e),
    }
}

async fn transcript_handler(
    State(state): State<ApiState>,
    Path(chat_id): Path<String>,
) -> ApiResult {
    let chat_id = resolve_chat_id(Some(&chat_id));

    let Some(handle) = state.sessions.get(chat_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("No concierge session {}", chat_id))),
        );
    };

    let Ok(session) = handle.try_lock() else {
        return busy();
    };

    ok(serde_json::json!({
        "chat_id": chat_id.to_string(),
        "state": session.relay().state_name(),
        "messages": session.transcript(),
    }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/masterplan", get(masterplan_handler))
        .route("/api/masterplan/:id", get(hotspot_handler))
        .route("/api/projection", post(projection_handler))
        .route("/api/plots/quote", post(quote_handler))
        .route("/api/concierge/chat", post(chat_handler))
        .route("/api/concierge/:chat_id/transcript", get(transcript_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
