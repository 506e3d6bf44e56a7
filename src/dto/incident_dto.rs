//! DTOs de incidentes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::incident::{Incident, IncidentPriority, IncidentStatus, IncidentType};

/// Request para crear un incidente estándar
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIncidentRequest {
    pub round_id: Uuid,
    pub incident_type: IncidentType,
    pub priority: IncidentPriority,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

/// Request del fast-path de emergencia
///
/// Sin referencia a ronda: tipo y prioridad son fijos del lado del
/// servidor, solo viajan la posición (si el dispositivo la consiguió) y
/// una descripción opcional.
#[derive(Debug, Deserialize, Validate)]
pub struct EmergencyIncidentRequest {
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

/// Request para resolver un incidente
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveIncidentRequest {
    #[validate(length(max = 2000))]
    pub resolution_notes: Option<String>,
}

/// Response de incidente para la API
#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub id: Uuid,
    pub round_id: Uuid,
    /// Marcado cuando el incidente entró por el fast-path de emergencia
    pub emergency_fast_path: bool,
    pub incident_type: IncidentType,
    pub priority: IncidentPriority,
    pub status: IncidentStatus,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub reported_at: DateTime<Utc>,
    pub investigated_by: Option<Uuid>,
    pub investigated_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id,
            round_id: incident.round_id,
            emergency_fast_path: incident.is_emergency_fast_path(),
            incident_type: incident.incident_type,
            priority: incident.priority,
            status: incident.status,
            description: incident.description,
            lat: incident.lat,
            lng: incident.lng,
            reported_at: incident.reported_at,
            investigated_by: incident.investigated_by,
            investigated_at: incident.investigated_at,
            resolved_by: incident.resolved_by,
            resolved_at: incident.resolved_at,
            resolution_notes: incident.resolution_notes,
        }
    }
}
