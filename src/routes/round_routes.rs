//! Rutas de rondas

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::round_controller::RoundController;
use crate::dto::incident_dto::IncidentResponse;
use crate::dto::round_dto::{
    CreateRoundRequest, FinishRoundRequest, RoundDetailResponse, RoundResponse, StartRoundRequest,
    TracePointRequest, VisitRequest, VisitResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::checkpoint::Checkpoint;
use crate::models::route_point::RoutePoint;
use crate::services::metrics_service::RoundMetrics;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_round_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_round))
        .route("/active/:operator_id", get(active_round))
        .route("/:id", get(get_round))
        .route("/:id", delete(delete_round))
        .route("/:id/start", post(start_round))
        .route("/:id/visit", post(record_visit))
        .route("/:id/visit", get(list_visits))
        .route("/:id/finish", post(finish_round))
        .route("/:id/trace", post(append_trace))
        .route("/:id/trace", get(get_trace))
        .route("/:id/checkpoints", get(list_checkpoints))
        .route("/:id/incidents", get(list_round_incidents))
        .route("/:id/metrics", get(round_metrics))
}

fn controller(state: &AppState) -> RoundController {
    RoundController::new(state.pool.clone(), state.trace_live.clone())
}

async fn create_round(
    State(state): State<AppState>,
    Json(request): Json<CreateRoundRequest>,
) -> Result<Json<ApiResponse<RoundResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(response))
}

async fn get_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundDetailResponse>, AppError> {
    let response = controller(&state).get(id).await?;
    Ok(Json(response))
}

async fn active_round(
    State(state): State<AppState>,
    Path(operator_id): Path<Uuid>,
) -> Result<Json<Option<RoundResponse>>, AppError> {
    let response = controller(&state).active_for_operator(operator_id).await?;
    Ok(Json(response))
}

async fn list_checkpoints(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Checkpoint>>, AppError> {
    let response = controller(&state).checkpoints(id).await?;
    Ok(Json(response))
}

async fn list_round_incidents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<IncidentResponse>>, AppError> {
    let response = controller(&state).round_incidents(id).await?;
    Ok(Json(response))
}

async fn start_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StartRoundRequest>,
) -> Result<Json<ApiResponse<RoundResponse>>, AppError> {
    let response = controller(&state).start(id, request).await?;
    Ok(Json(response))
}

async fn record_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<VisitRequest>,
) -> Result<Json<ApiResponse<VisitResponse>>, AppError> {
    let response = controller(&state).record_visit(id, request).await?;
    Ok(Json(response))
}

async fn list_visits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<VisitResponse>>, AppError> {
    let response = controller(&state).visits(id).await?;
    Ok(Json(response))
}

async fn finish_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FinishRoundRequest>,
) -> Result<Json<ApiResponse<RoundResponse>>, AppError> {
    let response = controller(&state).finish(id, request).await?;
    Ok(Json(response))
}

async fn append_trace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TracePointRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let response = controller(&state).append_trace(id, request).await?;
    Ok(Json(response))
}

async fn get_trace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RoutePoint>>, AppError> {
    let response = controller(&state).trace(id).await?;
    Ok(Json(response))
}

async fn round_metrics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundMetrics>, AppError> {
    let response = controller(&state)
        .metrics(id, state.config.fuel_price_per_liter)
        .await?;
    Ok(Json(response))
}

async fn delete_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.ensure_admin()?;

    let message = controller(&state)
        .destroy(id, user.user_id, &user.name, user.role)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message
    })))
}
