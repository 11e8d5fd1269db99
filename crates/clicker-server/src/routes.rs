//! HTTP transport: maps routes onto ledger runs and ledger errors onto
//! status codes.
//!
//! | Route           | Ledger call                         |
//! |-----------------|-------------------------------------|
//! | `GET /state`    | `snapshot`                          |
//! | `POST /tap`     | `perform(Tap)`                      |
//! | `POST /buy`     | `perform(Buy(index))`, body `{index}` |
//! | `POST /upgrade` | `perform(Upgrade(index))`, body `{index}` |
//!
//! The CORS layer answers every `OPTIONS` before routing. Anything else is a
//! 404. Refused actions and bad bodies are 400; store or encoding failures
//! are 500.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clicker_core::engine::Action;
use clicker_core::error::EngineError;
use clicker_core::ledger::{Ledger, LedgerError};
use clicker_core::money::Millis;
use clicker_core::state::GameState;
use clicker_core::store::StateStore;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ConfigError;

/// The ledger every handler shares.
pub type SharedLedger = Arc<Ledger<Box<dyn StateStore>>>;

/// Source of "now" for accrual. Swappable so tests can pin time.
pub type Clock = Arc<dyn Fn() -> Millis + Send + Sync>;

/// Handler state.
#[derive(Clone)]
pub struct AppState {
    ledger: SharedLedger,
    clock: Clock,
}

impl AppState {
    /// State backed by the system clock.
    pub fn new(ledger: SharedLedger) -> Self {
        Self::with_clock(ledger, Arc::new(system_clock))
    }

    pub fn with_clock(ledger: SharedLedger, clock: Clock) -> Self {
        Self { ledger, clock }
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn system_clock() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(app: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/state", get(get_state).fallback(not_found))
        .route("/tap", post(post_tap).fallback(not_found))
        .route("/buy", post(post_buy).fallback(not_found))
        .route("/upgrade", post(post_upgrade).fallback(not_found))
        .fallback(not_found)
        .with_state(app)
        .layer(cors)
}

/// CORS policy for browser clients. `*` allows any origin.
pub fn cors_layer(allow_origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = if allow_origin == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(allow_origin).map_err(|e| ConfigError::Invalid {
            field: "allow_origin",
            detail: e.to_string(),
        })?;
        AllowOrigin::exact(value)
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_state(State(app): State<AppState>) -> Result<Json<GameState>, ApiError> {
    run(app, None).await
}

async fn post_tap(State(app): State<AppState>) -> Result<Json<GameState>, ApiError> {
    run(app, Some(Action::Tap)).await
}

async fn post_buy(State(app): State<AppState>, body: Bytes) -> Result<Json<GameState>, ApiError> {
    let index = generator_index(&body)?;
    run(app, Some(Action::Buy(index))).await
}

async fn post_upgrade(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<GameState>, ApiError> {
    let index = generator_index(&body)?;
    run(app, Some(Action::Upgrade(index))).await
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Run one ledger pipeline off the async executor; stores may block.
async fn run(app: AppState, action: Option<Action>) -> Result<Json<GameState>, ApiError> {
    let now = (app.clock)();
    let ledger = Arc::clone(&app.ledger);
    let result = tokio::task::spawn_blocking(move || match action {
        None => ledger.snapshot(now),
        Some(action) => ledger.perform(action, now),
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "ledger task failed");
        ApiError::Internal
    })?;
    Ok(Json(result?))
}

/// Pull a positive generator index out of a `{ "index": n }` body.
/// Any whole JSON number counts, so `2.0` names generator 2. An unreadable
/// body is treated like an empty object.
pub fn generator_index(body: &[u8]) -> Result<u32, EngineError> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("index"))
        .and_then(serde_json::Value::as_f64)
        .filter(|index| index.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(index))
        .map(|index| index as u32)
        .ok_or_else(|| EngineError::MalformedInput("No generator index".to_string()))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed request, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// The caller's request was refused.
    BadRequest(String),
    NotFound,
    /// Details are logged, not returned.
    Internal,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if err.is_client_error() {
            return ApiError::BadRequest(err.to_string());
        }
        tracing::error!(error = %err, "request failed");
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
