//! HTTP API over the simulation store.
//!
//! Every handler is a thin wrapper around one store call. The store sits
//! behind a single mutex; each request holds it for the duration of its
//! SQL and never across an await.

pub mod config;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rosistat_core::{
    error::SimError,
    store::{NewSimulation, NewSpin, SimStore, SpinStats},
    types::{JsonMap, SimulationId},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use config::ServerConfig;

pub const SERVICE_NAME: &str = "rosistat-backend";

pub struct AppState {
    store:    Mutex<SimStore>,
    env:      String,
    db_ready: AtomicBool,
}

impl AppState {
    pub fn new(store: SimStore, env: impl Into<String>) -> Self {
        Self {
            store:    Mutex::new(store),
            env:      env.into(),
            db_ready: AtomicBool::new(false),
        }
    }

    pub fn mark_ready(&self) {
        self.db_ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.db_ready.load(Ordering::SeqCst)
    }

    fn store(&self) -> Result<MutexGuard<'_, SimStore>, ApiError> {
        self.store.lock().map_err(|_| ApiError::Poisoned)
    }
}

/// Open the database, apply migrations, then seeds when enabled.
///
/// A missing migrations or seeds directory is skipped with a warning. A
/// failing migration aborts startup.
pub fn initialize(config: &ServerConfig) -> Result<SimStore, SimError> {
    let store = SimStore::open(&config.db_file)?;

    if config.migrations_dir.is_dir() {
        let report = store.migrate(&config.migrations_dir)?;
        log::info!(
            "[DB] Migrations complete: {} applied, {} already present",
            report.applied.len(),
            report.skipped.len()
        );
    } else {
        log::warn!(
            "[DB] Migrations directory not found, skipping: {}",
            config.migrations_dir.display()
        );
    }
    log::info!("[DB] Tables: {}", store.table_names()?.join(", "));

    if !config.seed_on_start {
        log::info!("[DB] Seeding disabled");
    } else if config.seeds_dir.is_dir() {
        let seeded = store.apply_seeds(&config.seeds_dir)?;
        log::info!("[DB] Applied {} seed file(s)", seeded.len());
    } else {
        log::warn!("[DB] Seeds directory not found, skipping: {}", config.seeds_dir.display());
    }

    Ok(store)
}

pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/users/:uid", get(get_user))
        .route("/api/simulations", get(list_simulations).post(create_simulation))
        .route("/api/simulations/:id", get(get_simulation))
        .route("/api/simulations/:id/spins", get(list_spins))
        .route("/api/simulations/:id/spins/stats", get(spin_stats))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.json_limit))
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let allowed = origins.to_vec();
    cors.allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| config::origin_allowed(&allowed, o))
                .unwrap_or(false)
        }))
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{message}")]
    Body { status: StatusCode, message: String },

    #[error(transparent)]
    Store(#[from] SimError),

    #[error("store lock poisoned")]
    Poisoned,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Oversized bodies keep their 413; anything else undecodable is a 500.
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::Body { status, message: rejection.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            Self::Body { status, message } => (status, message),
            Self::Store(SimError::Database(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        if status.is_server_error() {
            log::error!("[API] {message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ── Handlers ───────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({ "service": SERVICE_NAME, "status": "ok" }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "ok", "env": state.env, "dbReady": state.is_ready() }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

async fn get_user(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> ApiResult<Response> {
    match state.store()?.user(&uid)? {
        Some(user) => Ok(Json(user).into_response()),
        None => Err(ApiError::NotFound("User not found")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: Option<String>,
}

async fn list_simulations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let user_id = query.user_id.as_deref().filter(|u| !u.is_empty());
    let simulations = state.store()?.list_simulations(user_id)?;
    Ok(Json(simulations).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSimulation {
    user_id:             Option<String>,
    strategy:            String,
    starting_investment: f64,
    final_earnings:      f64,
    final_portfolio:     f64,
    total_spins:         i64,
    #[serde(default)]
    settings:            JsonMap,
    #[serde(default)]
    results:             Option<Vec<JsonMap>>,
}

async fn create_simulation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateSimulation>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let store = state.store()?;

    let simulation = NewSimulation {
        user_id:             body.user_id,
        strategy:            body.strategy,
        starting_investment: body.starting_investment,
        final_earnings:      body.final_earnings,
        final_portfolio:     body.final_portfolio,
        total_spins:         body.total_spins,
        settings:            body.settings,
    };
    let results = body.results.unwrap_or_default();
    let id = store.create_simulation_with_spins(&simulation, |id| {
        Ok(results
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| spin_from_result(id, idx, raw))
            .collect())
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": id }))).into_response())
}

/// Map one client-side result object to a spin row. The spin number falls
/// back to the 1-based position; missing numeric fields become 0.
fn spin_from_result(simulation_id: SimulationId, idx: usize, raw: JsonMap) -> NewSpin {
    let int = |key: &str| raw.get(key).and_then(whole_number);
    let float = |key: &str| raw.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    NewSpin {
        simulation_id,
        spin_number:         int("spin").unwrap_or(idx as i64 + 1),
        drawn_number:        int("drawnNumber").unwrap_or(0),
        spin_net_result:     float("spinNetResult"),
        cumulative_earnings: float("cumulativeEarnings"),
        raw,
    }
}

/// Integers, and floats with no fractional part such as `17.0`.
fn whole_number(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn parse_id(raw: &str) -> Option<SimulationId> {
    raw.trim().parse().ok()
}

async fn get_simulation(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Err(ApiError::NotFound("Not found"));
    };
    match state.store()?.simulation_with_spins(id)? {
        Some(found) => Ok(Json(found).into_response()),
        None => Err(ApiError::NotFound("Not found")),
    }
}

#[derive(Debug, Deserialize)]
struct SpinsQuery {
    limit:  Option<String>,
    offset: Option<String>,
}

async fn list_spins(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SpinsQuery>,
) -> ApiResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Ok(Json(Vec::<Value>::new()).into_response());
    };
    let limit = query.limit.as_deref().and_then(|l| l.trim().parse().ok());
    let offset = query.offset.as_deref().and_then(|o| o.trim().parse().ok());
    let spins = state.store()?.list_spins(id, limit, offset)?;
    Ok(Json(spins).into_response())
}

async fn spin_stats(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let stats = match parse_id(&id) {
        Some(id) => state.store()?.spin_stats(id)?,
        None => SpinStats::default(),
    };
    Ok(Json(stats).into_response())
}
