//! Modelo de RoutePoint
//!
//! Una muestra de posición del dispositivo con timestamp, recolectada
//! durante una ronda. Para una ronda dada los puntos se agregan en orden
//! no decreciente de `recorded_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// RoutePoint principal - mapea exactamente a la tabla route_points
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutePoint {
    pub id: Uuid,
    pub round_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub recorded_at: DateTime<Utc>,
}
