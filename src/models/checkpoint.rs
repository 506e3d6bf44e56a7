//! Modelo de Checkpoint
//!
//! Un checkpoint es un punto físico dentro del sitio de un cliente que
//! debe verificarse durante una ronda, identificado por un código
//! escaneable. Los checkpoints son propiedad de los colaboradores de
//! gestión de clientes y aquí se tratan como entrada de solo lectura.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Checkpoint principal - mapea exactamente a la tabla checkpoints
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Checkpoint {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    /// Orden de visita previsto - metadato consultivo para display,
    /// nunca se valida como secuencia en la verificación
    pub order_index: i32,
    /// Código de 9 dígitos impreso en el punto físico
    pub code: String,
    /// Coordenadas registradas, usadas como fallback cuando el
    /// dispositivo no entrega posición al momento del escaneo
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}
