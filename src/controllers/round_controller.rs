//! Controller de rondas
//!
//! Orquesta requests HTTP hacia el controlador de ciclo de vida, el
//! motor de verificación, la ingesta de traza y las métricas.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::dto::round_dto::{
    CreateRoundRequest, FinishRoundRequest, RoundDetailResponse, RoundResponse, StartRoundRequest,
    TracePointRequest, VisitRequest, VisitResponse,
};
use crate::dto::incident_dto::IncidentResponse;
use crate::dto::ApiResponse;
use crate::models::checkpoint::Checkpoint;
use crate::models::route_point::RoutePoint;
use crate::models::user::UserRole;
use crate::models::visit::VisitStatus;
use crate::repositories::{
    CheckpointRepository, CheckpointStore, IncidentRepository, RoutePointRepository,
    RoutePointStore,
};
use crate::services::metrics_service::{MetricsService, RoundMetrics};
use crate::services::round_service::RoundService;
use crate::services::trace_recorder::{PersistingTraceSink, TraceSample, TraceSink};
use crate::utils::errors::AppError;
use crate::utils::geo::LatLng;

pub struct RoundController {
    service: RoundService,
    metrics: MetricsService,
    route_points: RoutePointRepository,
    checkpoints: CheckpointRepository,
    incidents: IncidentRepository,
    trace_sink: PersistingTraceSink,
}

impl RoundController {
    pub fn new(pool: PgPool, trace_live: broadcast::Sender<TraceSample>) -> Self {
        Self {
            service: RoundService::new(pool.clone()),
            metrics: MetricsService::new(pool.clone()),
            route_points: RoutePointRepository::new(pool.clone()),
            checkpoints: CheckpointRepository::new(pool.clone()),
            incidents: IncidentRepository::new(pool.clone()),
            trace_sink: PersistingTraceSink::new(
                Arc::new(RoutePointRepository::new(pool)),
                trace_live,
            ),
        }
    }

    pub async fn create(
        &self,
        request: CreateRoundRequest,
    ) -> Result<ApiResponse<RoundResponse>, AppError> {
        request.validate()?;

        let round = self
            .service
            .create(
                request.client_id,
                request.operator_id,
                request.vehicle_id,
                request.vehicle_type,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            round.into(),
            "Round created".to_string(),
        ))
    }

    pub async fn get(&self, id: Uuid) -> Result<RoundDetailResponse, AppError> {
        let round = self.service.get(id).await?;
        let open_incidents = self.incidents.count_open_by_round(id).await?;

        Ok(RoundDetailResponse {
            round: round.into(),
            open_incidents,
        })
    }

    /// Ronda activa del operador, o null si no tiene ninguna en curso
    pub async fn active_for_operator(
        &self,
        operator_id: Uuid,
    ) -> Result<Option<RoundResponse>, AppError> {
        let round = self.service.active_for_operator(operator_id).await?;
        Ok(round.map(RoundResponse::from))
    }

    /// Checkpoints del cliente de la ronda, en orden de visita previsto
    pub async fn checkpoints(&self, id: Uuid) -> Result<Vec<Checkpoint>, AppError> {
        let round = self.service.get(id).await?;
        self.checkpoints.find_by_client(round.client_id).await
    }

    pub async fn start(
        &self,
        id: Uuid,
        request: StartRoundRequest,
    ) -> Result<ApiResponse<RoundResponse>, AppError> {
        request.validate()?;

        let position = LatLng::from_parts(request.lat, request.lng);
        let round = self
            .service
            .start(id, request.start_odometer, position)
            .await?;

        Ok(ApiResponse::success_with_message(
            round.into(),
            "Round started".to_string(),
        ))
    }

    pub async fn record_visit(
        &self,
        id: Uuid,
        request: VisitRequest,
    ) -> Result<ApiResponse<VisitResponse>, AppError> {
        request.validate()?;

        let position = LatLng::from_parts(request.lat, request.lng);
        let source = request.source.unwrap_or(VisitStatus::Scanned);
        let visit = self
            .service
            .record_visit(id, &request.token, position, source)
            .await?;

        Ok(ApiResponse::success_with_message(
            visit.into(),
            "Checkpoint verified".to_string(),
        ))
    }

    pub async fn visits(&self, id: Uuid) -> Result<Vec<VisitResponse>, AppError> {
        let visits = self.service.visits(id).await?;
        Ok(visits.into_iter().map(VisitResponse::from).collect())
    }

    pub async fn finish(
        &self,
        id: Uuid,
        request: FinishRoundRequest,
    ) -> Result<ApiResponse<RoundResponse>, AppError> {
        let round = self.service.finish(id, request.end_odometer).await?;

        Ok(ApiResponse::success_with_message(
            round.into(),
            "Round completed".to_string(),
        ))
    }

    /// Ingesta de una muestra de traza enviada por el dispositivo
    ///
    /// Solo una ronda en curso acepta muestras; contra una pendiente o
    /// completada la ingesta se rechaza. Un duplicado exacto por
    /// reintento de red se descarta de forma idempotente.
    pub async fn append_trace(
        &self,
        id: Uuid,
        request: TracePointRequest,
    ) -> Result<ApiResponse<()>, AppError> {
        request.validate()?;

        let round = self.service.get(id).await?;
        round.ensure_trace_attachable()?;

        self.trace_sink
            .record(TraceSample {
                round_id: Some(id),
                position: LatLng::new(request.lat, request.lng),
                recorded_at: request.recorded_at,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            (),
            "Trace point recorded".to_string(),
        ))
    }

    pub async fn trace(&self, id: Uuid) -> Result<Vec<RoutePoint>, AppError> {
        self.route_points.find_by_round(id).await
    }

    /// Incidentes reportados durante la ronda, más recientes primero
    pub async fn round_incidents(&self, id: Uuid) -> Result<Vec<IncidentResponse>, AppError> {
        self.service.get(id).await?;
        let incidents = self.incidents.find_by_round(id).await?;
        Ok(incidents.into_iter().map(IncidentResponse::from).collect())
    }

    pub async fn metrics(
        &self,
        id: Uuid,
        fuel_price_per_liter: Decimal,
    ) -> Result<RoundMetrics, AppError> {
        self.metrics.round_metrics(id, fuel_price_per_liter).await
    }

    pub async fn destroy(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.service.destroy(id, admin_id, admin_name, role).await
    }
}
