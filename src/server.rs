// Finance Tracker - REST API with Axum
//
// Thin HTTP layer over the store and the categorization engine. The caller is
// identified by the `X-User-Id` header; authentication itself lives in front
// of this service.

use crate::categorization::{CategorizationEngine, CategorizationError, CategorizationRequest};
use crate::db;
use crate::entities::{is_hex_color, Category, TransactionKind};
use crate::feedback::{
    check_len, FeedbackRecord, FeedbackStats, NewFeedback, MAX_DESCRIPTION_LEN, RECENT_LIMIT,
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const USER_HEADER: &str = "x-user-id";

const MAX_CATEGORY_NAME_LEN: usize = 50;
const MAX_ICON_LEN: usize = 10;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    engine: Arc<CategorizationEngine>,
}

impl AppState {
    pub fn new(conn: Connection, engine: CategorizationEngine) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            engine: Arc::new(engine),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Validation(Vec<String>),
    BadRequest(String),
    NotFound(&'static str),
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                format!("Missing {} header", USER_HEADER),
                vec![],
            ),
            ApiError::Validation(details) => {
                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), details)
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, vec![]),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what), vec![]),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    vec![],
                )
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

impl From<CategorizationError> for ApiError {
    fn from(err: CategorizationError) -> Self {
        ApiError::Validation(vec![err.to_string()])
    }
}

// ============================================================================
// Caller identity
// ============================================================================

/// Id of the calling user, taken from the `X-User-Id` header
#[derive(Debug, Clone)]
pub struct UserId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserId(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
struct CategorizeBody {
    description: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct CategorizeResponse {
    category: String,
    confidence: f64,
    alternatives: Vec<String>,
    description: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
}

#[derive(Deserialize)]
struct KindQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Serialize)]
struct DefaultCategoriesResponse {
    #[serde(rename = "type")]
    kind: TransactionKind,
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct CreateCategoryBody {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    color: String,
    icon: String,
}

#[derive(Serialize)]
struct FeedbackCreated {
    message: &'static str,
    feedback: FeedbackRecord,
}

fn parse_kind(raw: &str, errors: &mut Vec<String>) -> Option<TransactionKind> {
    match TransactionKind::from_wire(raw) {
        Ok(kind) => Some(kind),
        Err(err) => {
            errors.push(err.to_string());
            None
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "OK" }))
}

/// POST /api/ai/categorize - Suggest one of the caller's categories
async fn categorize(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    payload: Result<Json<CategorizeBody>, JsonRejection>,
) -> Result<Json<CategorizeResponse>, ApiError> {
    let Json(body) = payload?;

    let description = body.description.trim().to_string();
    let mut errors = Vec::new();
    check_len(&mut errors, "description", &description, MAX_DESCRIPTION_LEN);
    let kind = parse_kind(&body.kind, &mut errors);

    let kind = match kind {
        Some(kind) if errors.is_empty() => kind,
        _ => return Err(ApiError::Validation(errors)),
    };

    let categories = {
        let conn = state.conn()?;
        db::get_candidate_categories(&conn, &user_id, kind)?
    };

    if categories.is_empty() {
        return Err(ApiError::BadRequest(
            "No categories found for this transaction type".to_string(),
        ));
    }

    let request = CategorizationRequest::new(
        description.clone(),
        kind,
        categories.iter().map(Category::to_user_category).collect(),
    );
    let result = state.engine.categorize(&request)?;

    tracing::info!(
        user = %user_id,
        kind = %kind,
        category = %result.category,
        confidence = result.confidence,
        "categorized transaction"
    );

    Ok(Json(CategorizeResponse {
        category: result.category,
        confidence: result.confidence,
        alternatives: result.alternatives,
        description,
        kind,
    }))
}

/// GET /api/ai/categories?type= - Dictionary categories for users without their own
async fn default_categories(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<DefaultCategoriesResponse>, ApiError> {
    let mut errors = Vec::new();
    let kind = match query.kind.as_deref() {
        Some(raw) => parse_kind(raw, &mut errors),
        None => {
            errors.push("type is required".to_string());
            None
        }
    };
    let kind = kind.ok_or(ApiError::Validation(errors))?;

    Ok(Json(DefaultCategoriesResponse {
        kind,
        categories: state.engine.dictionary().default_categories(kind),
    }))
}

/// POST /api/ai/feedback - Record whether a suggestion was kept
async fn submit_feedback(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    payload: Result<Json<NewFeedback>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let feedback = body.validated().map_err(ApiError::Validation)?;
    let record = FeedbackRecord::new(&user_id, feedback);

    {
        let conn = state.conn()?;
        db::insert_feedback(&conn, &record)?;
    }

    tracing::info!(
        user = %user_id,
        suggested = %record.suggested_category,
        correct = record.is_correct,
        "feedback recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(FeedbackCreated {
            message: "Feedback submitted successfully",
            feedback: record,
        }),
    ))
}

/// GET /api/ai/feedback/stats - Suggestion accuracy for the caller
async fn feedback_stats(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<FeedbackStats>, ApiError> {
    let conn = state.conn()?;
    Ok(Json(db::get_feedback_stats(&conn, &user_id)?))
}

/// GET /api/ai/feedback/recent - Latest feedback, newest first
async fn recent_feedback(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<FeedbackRecord>>, ApiError> {
    let conn = state.conn()?;
    Ok(Json(db::get_recent_feedback(&conn, &user_id, RECENT_LIMIT)?))
}

/// GET /api/categories[?type=] - The caller's categories
async fn list_categories(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let kind = match query.kind.as_deref() {
        Some(raw) => {
            let mut errors = Vec::new();
            Some(parse_kind(raw, &mut errors).ok_or(ApiError::Validation(errors))?)
        }
        None => None,
    };

    let conn = state.conn()?;
    Ok(Json(db::get_categories(&conn, &user_id, kind)?))
}

/// GET /api/categories/:id
async fn get_category(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let conn = state.conn()?;
    db::get_category(&conn, &user_id, &id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Category"))
}

/// POST /api/categories - Create a category
async fn create_category(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    payload: Result<Json<CreateCategoryBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;

    let name = body.name.trim();
    let icon = body.icon.trim();
    let mut errors = Vec::new();
    check_len(&mut errors, "name", name, MAX_CATEGORY_NAME_LEN);
    let kind = parse_kind(&body.kind, &mut errors);
    if !is_hex_color(&body.color) {
        errors.push("color must be a hex color".to_string());
    }
    check_len(&mut errors, "icon", icon, MAX_ICON_LEN);

    let kind = match kind {
        Some(kind) if errors.is_empty() => kind,
        _ => return Err(ApiError::Validation(errors)),
    };

    let category = Category::with_display(&user_id, name, kind, &body.color, icon);
    let inserted = {
        let conn = state.conn()?;
        db::insert_category(&conn, &category)?
    };

    if !inserted {
        return Err(ApiError::BadRequest(
            "Category with this name already exists".to_string(),
        ));
    }

    tracing::info!(user = %user_id, name = %category.name, kind = %kind, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// DELETE /api/categories/:id
async fn delete_category(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = state.conn()?;
    if db::delete_category(&conn, &user_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Category"))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let ai_routes = Router::new()
        .route("/categorize", post(categorize))
        .route("/categories", get(default_categories))
        .route("/feedback", post(submit_feedback))
        .route("/feedback/stats", get(feedback_stats))
        .route("/feedback/recent", get(recent_feedback));

    let category_routes = Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).delete(delete_category));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .nest("/ai", ai_routes)
        .nest("/categories", category_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// TESTS
// ============================================================================
