//! Modelo de Incident
//!
//! Un incidente es un reporte de anomalía, opcionalmente ligado a una
//! ronda, con prioridad y estado de resolución. El fast-path de
//! emergencia usa la identidad centinela "sin ronda" (UUID nulo).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::TransitionError;

/// Identidad centinela para incidentes sin ronda (fast-path de emergencia)
pub const NO_ROUND: Uuid = Uuid::nil();

/// Estado del incidente - mapea al ENUM incident_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "incident_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
}

impl IncidentStatus {
    /// Verificar la legalidad de una transición de estado
    ///
    /// Camino estándar `Open → Investigating → Resolved`, más la
    /// reapertura `Resolved → Open`. Ningún paso salta `Investigating`.
    pub fn ensure_transition(self, to: IncidentStatus) -> Result<(), TransitionError> {
        let legal = matches!(
            (self, to),
            (IncidentStatus::Open, IncidentStatus::Investigating)
                | (IncidentStatus::Investigating, IncidentStatus::Resolved)
                | (IncidentStatus::Resolved, IncidentStatus::Open)
        );

        if legal {
            Ok(())
        } else {
            Err(TransitionError(format!(
                "incident cannot go from '{:?}' to '{:?}'",
                self, to
            )))
        }
    }
}

/// Prioridad del incidente - mapea al ENUM incident_priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "incident_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Tipo de incidente - mapea al ENUM incident_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "incident_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentType {
    Emergency,
    Suspicious,
    Breakage,
    Theft,
    Other,
}

/// Incident principal - mapea exactamente a la tabla incidents
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub id: Uuid,
    /// UUID nulo cuando el incidente llegó por el fast-path de emergencia
    pub round_id: Uuid,
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

impl Incident {
    /// Verificar si el incidente llegó por el fast-path de emergencia
    pub fn is_emergency_fast_path(&self) -> bool {
        self.round_id == NO_ROUND
    }
}
