// Axum API Server Module
//
// REST layer over the in-memory store: CRUD for households / disasters /
// assessments, per-disaster GeoJSON, explicit recomputation, SMS drafting.

#[cfg(feature = "api")]
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

#[cfg(feature = "api")]
use moka::future::Cache;

#[cfg(feature = "api")]
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "api")]
use std::time::Duration;

#[cfg(feature = "api")]
use crate::data::{NewAssessment, NewDisasterEvent, NewHousehold, UpdateAssessment};

#[cfg(feature = "api")]
use crate::engine::EctEngine;

#[cfg(feature = "api")]
use crate::geojson;

#[cfg(feature = "api")]
use crate::sms::SmsClient;

#[cfg(feature = "api")]
use crate::store::{AssessmentStore, StoreError};

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<AssessmentStore>>,
    pub engine: Arc<EctEngine>,
    pub cache: Cache<String, serde_json::Value>,
    pub sms: Option<SmsClient>,
}

#[cfg(feature = "api")]
impl AppState {
    pub fn new(store: AssessmentStore, engine: EctEngine, sms: Option<SmsClient>) -> Self {
        tracing::info!(
            "Initializing application state ({} households, {} disasters, {} assessments, model: {})",
            store.household_count(),
            store.disaster_count(),
            store.assessment_count(),
            if engine.has_model() { "loaded" } else { "rule-only" }
        );

        let cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Self {
            store: Arc::new(RwLock::new(store)),
            engine: Arc::new(engine),
            cache,
            sms,
        }
    }

    fn read_store(&self) -> Result<RwLockReadGuard<'_, AssessmentStore>, AppError> {
        self.store
            .read()
            .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
    }

    fn write_store(&self) -> Result<RwLockWriteGuard<'_, AssessmentStore>, AppError> {
        self.store
            .write()
            .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Household endpoints
        // IMPORTANT: geojson route must come before :id (Axum matches in order)
        .route("/api/households/geojson", get(households_geojson))
        .route("/api/households", get(list_households).post(create_household))
        .route(
            "/api/households/:id",
            get(get_household).put(update_household).delete(delete_household),
        )

        // Disaster endpoints
        .route("/api/disasters", get(list_disasters).post(create_disaster))
        .route(
            "/api/disasters/:id",
            get(get_disaster).put(update_disaster).delete(delete_disaster),
        )
        .route("/api/disasters/:id/recompute", post(recompute_disaster))

        // Assessment endpoints
        .route("/api/assessments", get(list_assessments).post(create_assessment))
        .route(
            "/api/assessments/:id",
            get(get_assessment).put(update_assessment).delete(delete_assessment),
        )
        .route("/api/assessments/:id/recompute", post(recompute_assessment))

        // SMS drafting
        .route("/api/generate-sms", post(generate_sms))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// ---- Households ------------------------------------------------------------

#[cfg(feature = "api")]
async fn list_households(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let store = state.read_store()?;
    let data = store.households();
    Ok(Json(serde_json::json!({
        "rows": data.len(),
        "data": data,
    })))
}

#[cfg(feature = "api")]
async fn create_household(
    State(state): State<AppState>,
    Json(payload): Json<NewHousehold>,
) -> Result<impl IntoResponse, AppError> {
    let household = state.write_store()?.create_household(payload)?;
    state.cache.invalidate_all();
    Ok((StatusCode::CREATED, Json(household)))
}

#[cfg(feature = "api")]
async fn get_household(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = state.read_store()?;
    let household = store.household(id)?;
    Ok(Json(serde_json::to_value(household).map_err(internal)?))
}

#[cfg(feature = "api")]
async fn update_household(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<NewHousehold>,
) -> Result<Json<serde_json::Value>, AppError> {
    let household = state
        .write_store()?
        .update_household(&state.engine, id, payload)?;
    state.cache.invalidate_all();
    Ok(Json(serde_json::to_value(household).map_err(internal)?))
}

#[cfg(feature = "api")]
async fn delete_household(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.write_store()?.delete_household(id)?;
    state.cache.invalidate_all();
    Ok(StatusCode::NO_CONTENT)
}

/// Query params for the GeoJSON endpoint
#[cfg(feature = "api")]
#[derive(Debug, serde::Deserialize)]
struct GeojsonQuery {
    disaster_id: Option<u64>,
}

#[cfg(feature = "api")]
async fn households_geojson(
    State(state): State<AppState>,
    Query(params): Query<GeojsonQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let disaster_id = params
        .disaster_id
        .ok_or_else(|| AppError::BadRequest("disaster_id parameter is required".to_string()))?;

    let cache_key = format!("geojson:{}", disaster_id);
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for geojson disaster {}", disaster_id);
        return Ok(Json(cached));
    }

    let result = {
        let store = state.read_store()?;
        geojson::feature_collection(&store, disaster_id)?
    };

    state.cache.insert(cache_key, result.clone()).await;
    Ok(Json(result))
}

// ---- Disasters -------------------------------------------------------------

#[cfg(feature = "api")]
async fn list_disasters(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let store = state.read_store()?;
    let data = store.disasters();
    Ok(Json(serde_json::json!({
        "rows": data.len(),
        "data": data,
    })))
}

#[cfg(feature = "api")]
async fn create_disaster(
    State(state): State<AppState>,
    Json(payload): Json<NewDisasterEvent>,
) -> Result<impl IntoResponse, AppError> {
    let disaster = state.write_store()?.create_disaster(payload);
    state.cache.invalidate_all();
    Ok((StatusCode::CREATED, Json(disaster)))
}

#[cfg(feature = "api")]
async fn get_disaster(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = state.read_store()?;
    let disaster = store.disaster(id)?;
    Ok(Json(serde_json::to_value(disaster).map_err(internal)?))
}

#[cfg(feature = "api")]
async fn update_disaster(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<NewDisasterEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let disaster = state.write_store()?.update_disaster(id, payload)?;
    state.cache.invalidate_all();
    Ok(Json(serde_json::to_value(disaster).map_err(internal)?))
}

#[cfg(feature = "api")]
async fn delete_disaster(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.write_store()?.delete_disaster(id)?;
    state.cache.invalidate_all();
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(feature = "api")]
async fn recompute_disaster(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let count = state
        .write_store()?
        .recompute_for_disaster(&state.engine, id)?;
    state.cache.invalidate_all();
    tracing::info!("Recomputed {} assessments for disaster {}", count, id);
    Ok(Json(serde_json::json!({ "recomputed": count })))
}

// ---- Assessments -----------------------------------------------------------

/// Optional filters for the assessment list
#[cfg(feature = "api")]
#[derive(Debug, serde::Deserialize)]
struct AssessmentFilters {
    disaster_id: Option<u64>,
    household_id: Option<u64>,
}

#[cfg(feature = "api")]
async fn list_assessments(
    State(state): State<AppState>,
    Query(filters): Query<AssessmentFilters>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = state.read_store()?;
    let data: Vec<_> = store
        .assessments()
        .into_iter()
        .filter(|a| filters.disaster_id.map_or(true, |id| a.disaster_id == id))
        .filter(|a| filters.household_id.map_or(true, |id| a.household_id == id))
        .collect();
    Ok(Json(serde_json::json!({
        "rows": data.len(),
        "data": data,
    })))
}

#[cfg(feature = "api")]
async fn create_assessment(
    State(state): State<AppState>,
    Json(payload): Json<NewAssessment>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state
        .write_store()?
        .create_assessment(&state.engine, payload)?;
    state.cache.invalidate_all();
    Ok((StatusCode::CREATED, Json(assessment)))
}

#[cfg(feature = "api")]
async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = state.read_store()?;
    let assessment = store.assessment(id)?;
    Ok(Json(serde_json::to_value(assessment).map_err(internal)?))
}

#[cfg(feature = "api")]
async fn update_assessment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateAssessment>,
) -> Result<Json<serde_json::Value>, AppError> {
    let assessment = state
        .write_store()?
        .update_assessment(&state.engine, id, payload)?;
    state.cache.invalidate_all();
    Ok(Json(serde_json::to_value(assessment).map_err(internal)?))
}

#[cfg(feature = "api")]
async fn delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.write_store()?.delete_assessment(id)?;
    state.cache.invalidate_all();
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(feature = "api")]
async fn recompute_assessment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let assessment = state
        .write_store()?
        .recompute_assessment(&state.engine, id)?;
    state.cache.invalidate_all();
    Ok(Json(serde_json::to_value(assessment).map_err(internal)?))
}

// ---- SMS drafting ----------------------------------------------------------

/// Request body for SMS drafting; household fields are echoed back
#[cfg(feature = "api")]
#[derive(Debug, serde::Deserialize)]
struct SmsRequest {
    prompt: String,
    #[serde(default)]
    household_name: String,
    #[serde(default)]
    damage_status: String,
    #[serde(default)]
    ect_amount: u32,
}

#[cfg(feature = "api")]
async fn generate_sms(
    State(state): State<AppState>,
    Json(request): Json<SmsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client = state.sms.as_ref().ok_or_else(|| {
        AppError::Internal("SMS API key not configured; set SMS_API_KEY".to_string())
    })?;

    let message = client
        .generate(&request.prompt)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "sms_message": message,
        "household_name": request.household_name,
        "damage_status": request.damage_status,
        "ect_amount": request.ect_amount,
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
}

#[cfg(feature = "api")]
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::HouseholdNotFound(_)
            | StoreError::DisasterNotFound(_)
            | StoreError::AssessmentNotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::DuplicateAssessment { .. } => AppError::Conflict(err.to_string()),
            StoreError::InvalidValue { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(feature = "api")]
fn internal(err: impl std::fmt::Display) -> AppError {
    AppError::Internal(err.to_string())
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
