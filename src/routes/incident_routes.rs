//! Rutas de incidentes

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::incident_controller::IncidentController;
use crate::dto::incident_dto::{
    CreateIncidentRequest, EmergencyIncidentRequest, IncidentResponse, ResolveIncidentRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_incident_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_incident))
        .route("/emergency", post(create_emergency))
        .route("/:id", get(get_incident))
        .route("/:id", delete(delete_incident))
        .route("/:id/investigate", post(investigate_incident))
        .route("/:id/resolve", post(resolve_incident))
        .route("/:id/reopen", post(reopen_incident))
}

async fn create_incident(
    State(state): State<AppState>,
    Json(request): Json<CreateIncidentRequest>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let response = IncidentController::new(state.pool.clone()).create(request).await?;
    Ok(Json(response))
}

async fn create_emergency(
    State(state): State<AppState>,
    Json(request): Json<EmergencyIncidentRequest>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let response = IncidentController::new(state.pool.clone())
        .create_emergency(request)
        .await?;
    Ok(Json(response))
}

async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IncidentResponse>, AppError> {
    let response = IncidentController::new(state.pool.clone()).get(id).await?;
    Ok(Json(response))
}

async fn investigate_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let response = IncidentController::new(state.pool.clone())
        .investigate(id, user.user_id)
        .await?;
    Ok(Json(response))
}

async fn resolve_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ResolveIncidentRequest>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let response = IncidentController::new(state.pool.clone())
        .resolve(id, user.user_id, request)
        .await?;
    Ok(Json(response))
}

async fn reopen_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let response = IncidentController::new(state.pool.clone()).reopen(id).await?;
    Ok(Json(response))
}

async fn delete_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.ensure_admin()?;

    let message = IncidentController::new(state.pool.clone())
        .destroy(id, user.user_id, &user.name, user.role)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message
    })))
}
