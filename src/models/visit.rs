//! Modelo de CheckpointVisit
//!
//! Registro de una verificación exitosa de un checkpoint dentro de una
//! ronda específica. Invariante: la visita referencia un checkpoint que
//! pertenece al mismo cliente que su ronda.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Origen de la visita - mapea al ENUM visit_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "visit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    /// Código leído por cámara
    Scanned,
    /// Código digitado manualmente tras fallo de cámara
    Manual,
}

/// CheckpointVisit principal - mapea exactamente a la tabla checkpoint_visits
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckpointVisit {
    pub id: Uuid,
    pub round_id: Uuid,
    pub checkpoint_id: Uuid,
    pub visit_time: DateTime<Utc>,
    /// Posición del dispositivo al escanear, o las coordenadas
    /// registradas del checkpoint como fallback
    pub lat: f64,
    pub lng: f64,
    pub status: VisitStatus,
}
