//! Rutas del flujo de escaneo

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::scan_controller::ScanController;
use crate::dto::scan_dto::{
    DeliverScanRequest, ManualEntryRequest, ScanResultResponse, ScanSessionResponse,
};
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_scan_router() -> Router<AppState> {
    Router::new()
        .route("/session", post(open_session))
        .route("/session/:id", get(poll_session))
        .route("/session/:id", delete(cancel_session))
        .route("/deliver", post(deliver_scan))
        .route("/manual", post(manual_entry))
}

async fn open_session(State(state): State<AppState>) -> Json<ApiResponse<ScanSessionResponse>> {
    Json(ScanController::new(state.scan_relay.clone()).open_session())
}

async fn poll_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScanResultResponse>, AppError> {
    let response = ScanController::new(state.scan_relay.clone()).poll(id)?;
    Ok(Json(response))
}

async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<ApiResponse<()>> {
    Json(ScanController::new(state.scan_relay.clone()).cancel(id))
}

async fn deliver_scan(
    State(state): State<AppState>,
    Json(request): Json<DeliverScanRequest>,
) -> Result<Json<ApiResponse<ScanResultResponse>>, AppError> {
    let response = ScanController::new(state.scan_relay.clone()).deliver(request)?;
    Ok(Json(response))
}

async fn manual_entry(
    State(state): State<AppState>,
    Json(request): Json<ManualEntryRequest>,
) -> Result<Json<ApiResponse<ScanResultResponse>>, AppError> {
    let response = ScanController::new(state.scan_relay.clone()).deliver_manual(request)?;
    Ok(Json(response))
}
