//! Repositorio de rondas
//!
//! Persistencia de la tabla rounds, incluido el borrado auditado con
//! cascada sobre visitas, puntos de ruta e incidentes de la ronda.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::round::Round;
use crate::models::vehicle::VehicleType;
use crate::repositories::audit_repository;
use crate::utils::errors::AppError;
use crate::utils::geo::LatLng;

/// Mensaje de confirmación del borrado auditado de una ronda
pub fn deletion_confirmation(id: Uuid, admin_name: &str) -> String {
    format!(
        "Round {} and all its visits, route points and incidents were permanently deleted by {}",
        id, admin_name
    )
}

/// Almacén de rondas
///
/// `mark_started` activa la ronda y, si el dispositivo entregó posición,
/// abre la traza con el punto inicial; las dos escrituras son atómicas.
#[async_trait]
pub trait RoundStore: Send + Sync {
    async fn create(
        &self,
        client_id: Uuid,
        operator_id: Uuid,
        vehicle_id: Option<Uuid>,
        vehicle_type: VehicleType,
    ) -> Result<Round, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Round>, AppError>;

    async fn find_active_by_operator(&self, operator_id: Uuid)
        -> Result<Option<Round>, AppError>;

    async fn mark_started(
        &self,
        id: Uuid,
        start_odometer: Decimal,
        start_time: DateTime<Utc>,
        initial_position: Option<LatLng>,
    ) -> Result<Round, AppError>;

    async fn mark_finished(
        &self,
        id: Uuid,
        end_odometer: Decimal,
        end_time: DateTime<Utc>,
    ) -> Result<Round, AppError>;

    async fn delete_with_audit(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
    ) -> Result<String, AppError>;
}

pub struct RoundRepository {
    pool: PgPool,
}

impl RoundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoundStore for RoundRepository {
    /// Crear una ronda en estado pending
    async fn create(
        &self,
        client_id: Uuid,
        operator_id: Uuid,
        vehicle_id: Option<Uuid>,
        vehicle_type: VehicleType,
    ) -> Result<Round, AppError> {
        let round = sqlx::query_as::<_, Round>(
            r#"
            INSERT INTO rounds (id, client_id, operator_id, vehicle_id, vehicle_type, status, created_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(operator_id)
        .bind(vehicle_id)
        .bind(vehicle_type)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(round)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Round>, AppError> {
        let round = sqlx::query_as::<_, Round>("SELECT * FROM rounds WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(round)
    }

    /// Ronda activa del operador, si existe
    ///
    /// Cada dispositivo de operador maneja a lo sumo una ronda activa.
    async fn find_active_by_operator(
        &self,
        operator_id: Uuid,
    ) -> Result<Option<Round>, AppError> {
        let round = sqlx::query_as::<_, Round>(
            r#"
            SELECT * FROM rounds
            WHERE operator_id = $1 AND status IN ('active', 'incident')
            ORDER BY start_time DESC
            LIMIT 1
            "#,
        )
        .bind(operator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(round)
    }

    /// Marcar la ronda como activa con su lectura inicial de odómetro
    ///
    /// El update de estado y el punto inicial de traza van en una sola
    /// transacción: o la ronda queda activa con su traza abierta, o nada
    /// cambia.
    async fn mark_started(
        &self,
        id: Uuid,
        start_odometer: Decimal,
        start_time: DateTime<Utc>,
        initial_position: Option<LatLng>,
    ) -> Result<Round, AppError> {
        let mut tx = self.pool.begin().await?;

        let round = sqlx::query_as::<_, Round>(
            r#"
            UPDATE rounds
            SET status = 'active', start_time = $2, start_odometer = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(start_time)
        .bind(start_odometer)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(position) = initial_position {
            sqlx::query(
                r#"
                INSERT INTO route_points (id, round_id, lat, lng, recorded_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (round_id, recorded_at, lat, lng) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(position.lat)
            .bind(position.lng)
            .bind(start_time)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(round)
    }

    /// Marcar la ronda como completada con su lectura final de odómetro
    async fn mark_finished(
        &self,
        id: Uuid,
        end_odometer: Decimal,
        end_time: DateTime<Utc>,
    ) -> Result<Round, AppError> {
        let round = sqlx::query_as::<_, Round>(
            r#"
            UPDATE rounds
            SET status = 'completed', end_time = $2, end_odometer = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(end_time)
        .bind(end_odometer)
        .fetch_one(&self.pool)
        .await?;

        Ok(round)
    }

    /// Borrado auditado e irreversible de una ronda
    ///
    /// Escribe el registro de auditoría (admin y ronda afectada) antes de
    /// la cascada: visitas, puntos de ruta, incidentes y la ronda, todo
    /// en una transacción. Devuelve un mensaje de confirmación legible.
    async fn delete_with_audit(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
    ) -> Result<String, AppError> {
        let mut tx = self.pool.begin().await?;

        audit_repository::record_in_tx(&mut tx, "delete_round", id, admin_id, admin_name).await?;

        sqlx::query("DELETE FROM checkpoint_visits WHERE round_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM route_points WHERE round_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM incidents WHERE round_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM rounds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Round '{}' not found", id)));
        }

        tx.commit().await?;

        tracing::info!("Round {} deleted by admin {} ({})", id, admin_name, admin_id);
        Ok(deletion_confirmation(id, admin_name))
    }
}
