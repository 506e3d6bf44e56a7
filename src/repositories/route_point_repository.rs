//! Repositorio de puntos de ruta
//!
//! Escritura append-only de la traza GPS. Un reintento de red puede
//! duplicar una muestra exacta; el índice único sobre
//! (round_id, recorded_at, lat, lng) la descarta de forma idempotente.
//! Los casi-duplicados por jitter de GPS se aceptan.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::route_point::RoutePoint;
use crate::utils::errors::AppError;

/// Almacén de la traza GPS
///
/// `append` devuelve `Ok(None)` cuando la muestra es un duplicado
/// exacto ya almacenado; la fila original queda como única.
#[async_trait]
pub trait RoutePointStore: Send + Sync {
    async fn append(
        &self,
        round_id: Uuid,
        lat: f64,
        lng: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Option<RoutePoint>, AppError>;

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<RoutePoint>, AppError>;
}

pub struct RoutePointRepository {
    pool: PgPool,
}

impl RoutePointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoutePointStore for RoutePointRepository {
    /// Agregar una muestra de posición
    async fn append(
        &self,
        round_id: Uuid,
        lat: f64,
        lng: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Option<RoutePoint>, AppError> {
        let point = sqlx::query_as::<_, RoutePoint>(
            r#"
            INSERT INTO route_points (id, round_id, lat, lng, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (round_id, recorded_at, lat, lng) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(round_id)
        .bind(lat)
        .bind(lng)
        .bind(recorded_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(point)
    }

    /// Traza completa de la ronda en orden temporal
    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<RoutePoint>, AppError> {
        let points = sqlx::query_as::<_, RoutePoint>(
            "SELECT * FROM route_points WHERE round_id = $1 ORDER BY recorded_at ASC",
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }
}
