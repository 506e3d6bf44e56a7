//! DTOs de rondas

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::round::{Round, RoundStatus};
use crate::models::vehicle::VehicleType;
use crate::models::visit::{CheckpointVisit, VisitStatus};

/// Request para crear una ronda
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoundRequest {
    pub client_id: Uuid,
    pub operator_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
}

/// Request para iniciar una ronda
#[derive(Debug, Deserialize, Validate)]
pub struct StartRoundRequest {
    pub start_odometer: Decimal,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

/// Request para registrar la visita de un checkpoint
#[derive(Debug, Deserialize, Validate)]
pub struct VisitRequest {
    /// Token crudo: 9 dígitos o payload estructurado de checkpoint
    #[validate(length(min = 1, max = 512))]
    pub token: String,

    /// Origen del token; default escaneado por cámara
    pub source: Option<VisitStatus>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

/// Request para finalizar una ronda
#[derive(Debug, Deserialize, Validate)]
pub struct FinishRoundRequest {
    pub end_odometer: Decimal,
}

/// Request para agregar una muestra de traza
#[derive(Debug, Deserialize, Validate)]
pub struct TracePointRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    pub recorded_at: DateTime<Utc>,
}

/// Response de ronda para la API
#[derive(Debug, Serialize)]
pub struct RoundResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub operator_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
    pub status: RoundStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_odometer: Option<Decimal>,
    pub end_odometer: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl From<Round> for RoundResponse {
    fn from(round: Round) -> Self {
        Self {
            id: round.id,
            client_id: round.client_id,
            operator_id: round.operator_id,
            vehicle_id: round.vehicle_id,
            vehicle_type: round.vehicle_type,
            status: round.status,
            start_time: round.start_time,
            end_time: round.end_time,
            start_odometer: round.start_odometer,
            end_odometer: round.end_odometer,
            created_at: round.created_at,
        }
    }
}

/// Detalle de ronda: la ronda más el overlay de incidentes abiertos
#[derive(Debug, Serialize)]
pub struct RoundDetailResponse {
    #[serde(flatten)]
    pub round: RoundResponse,
    pub open_incidents: i64,
}

/// Response de visita para la API
#[derive(Debug, Serialize)]
pub struct VisitResponse {
    pub id: Uuid,
    pub round_id: Uuid,
    pub checkpoint_id: Uuid,
    pub visit_time: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub status: VisitStatus,
}

impl From<CheckpointVisit> for VisitResponse {
    fn from(visit: CheckpointVisit) -> Self {
        Self {
            id: visit.id,
            round_id: visit.round_id,
            checkpoint_id: visit.checkpoint_id,
            visit_time: visit.visit_time,
            lat: visit.lat,
            lng: visit.lng,
            status: visit.status,
        }
    }
}
