//! Repositorio de visitas a checkpoints
//!
//! La unicidad de (round_id, checkpoint_id) la respalda la restricción
//! única del esquema: dos envíos repetidos pueden pasar el pre-chequeo
//! de existencia, pero solo el primero inserta; el segundo sale como
//! visita duplicada y la visita original queda intacta.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::visit::{CheckpointVisit, VisitStatus};
use crate::utils::errors::{AppError, VerificationError};

/// Código SQLSTATE de violación de restricción única
const UNIQUE_VIOLATION_CODE: &str = "23505";

fn is_unique_violation(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION_CODE)
}

/// Almacén de visitas a checkpoints
///
/// `create` rechaza una segunda visita del mismo checkpoint en la misma
/// ronda con `VerificationError::DuplicateVisit`, también bajo envíos
/// concurrentes.
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn exists(&self, round_id: Uuid, checkpoint_id: Uuid) -> Result<bool, AppError>;

    async fn create(
        &self,
        round_id: Uuid,
        checkpoint_id: Uuid,
        visit_time: DateTime<Utc>,
        lat: f64,
        lng: f64,
        status: VisitStatus,
    ) -> Result<CheckpointVisit, AppError>;

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<CheckpointVisit>, AppError>;
}

pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitStore for VisitRepository {
    /// Verificar si el checkpoint ya fue visitado en esta ronda
    async fn exists(&self, round_id: Uuid, checkpoint_id: Uuid) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM checkpoint_visits WHERE round_id = $1 AND checkpoint_id = $2)",
        )
        .bind(round_id)
        .bind(checkpoint_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    async fn create(
        &self,
        round_id: Uuid,
        checkpoint_id: Uuid,
        visit_time: DateTime<Utc>,
        lat: f64,
        lng: f64,
        status: VisitStatus,
    ) -> Result<CheckpointVisit, AppError> {
        let visit = sqlx::query_as::<_, CheckpointVisit>(
            r#"
            INSERT INTO checkpoint_visits (id, round_id, checkpoint_id, visit_time, lat, lng, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(round_id)
        .bind(checkpoint_id)
        .bind(visit_time)
        .bind(lat)
        .bind(lng)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // la restricción única cierra la carrera entre el pre-chequeo
            // y el insert de dos envíos repetidos
            sqlx::Error::Database(db) if is_unique_violation(db.code().as_deref()) => {
                AppError::Verification(VerificationError::DuplicateVisit)
            }
            other => AppError::Database(other),
        })?;

        Ok(visit)
    }

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<CheckpointVisit>, AppError> {
        let visits = sqlx::query_as::<_, CheckpointVisit>(
            "SELECT * FROM checkpoint_visits WHERE round_id = $1 ORDER BY visit_time ASC",
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_code_detection() {
        assert!(is_unique_violation(Some("23505")));
        assert!(!is_unique_violation(Some("23503")));
        assert!(!is_unique_violation(None));
    }
}
