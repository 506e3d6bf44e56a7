//! Repositorio de incidentes

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::incident::{Incident, IncidentPriority, IncidentStatus, IncidentType};
use crate::repositories::audit_repository;
use crate::utils::errors::AppError;

pub struct IncidentRepository {
    pool: PgPool,
}

impl IncidentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear un incidente en estado open
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        round_id: Uuid,
        incident_type: IncidentType,
        priority: IncidentPriority,
        description: Option<String>,
        lat: f64,
        lng: f64,
    ) -> Result<Incident, AppError> {
        let incident = sqlx::query_as::<_, Incident>(
            r#"
            INSERT INTO incidents (id, round_id, incident_type, priority, status, description, lat, lng, reported_at)
            VALUES ($1, $2, $3, $4, 'open', $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(round_id)
        .bind(incident_type)
        .bind(priority)
        .bind(description)
        .bind(lat)
        .bind(lng)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(incident)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Incident>, AppError> {
        let incident = sqlx::query_as::<_, Incident>("SELECT * FROM incidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(incident)
    }

    pub async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<Incident>, AppError> {
        let incidents = sqlx::query_as::<_, Incident>(
            "SELECT * FROM incidents WHERE round_id = $1 ORDER BY reported_at DESC",
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(incidents)
    }

    /// Cantidad de incidentes abiertos de la ronda (overlay observable)
    pub async fn count_open_by_round(&self, round_id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM incidents WHERE round_id = $1 AND status != 'resolved'",
        )
        .bind(round_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Pasar a investigating, registrando quién investiga
    pub async fn mark_investigating(
        &self,
        id: Uuid,
        investigator_id: Uuid,
    ) -> Result<Incident, AppError> {
        let incident = sqlx::query_as::<_, Incident>(
            r#"
            UPDATE incidents
            SET status = 'investigating', investigated_by = $2, investigated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(investigator_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(incident)
    }

    /// Pasar a resolved con sus notas de resolución
    pub async fn mark_resolved(
        &self,
        id: Uuid,
        resolver_id: Uuid,
        resolution_notes: Option<String>,
    ) -> Result<Incident, AppError> {
        let incident = sqlx::query_as::<_, Incident>(
            r#"
            UPDATE incidents
            SET status = 'resolved', resolved_by = $2, resolved_at = $3, resolution_notes = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resolver_id)
        .bind(Utc::now())
        .bind(resolution_notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(incident)
    }

    /// Reabrir un incidente resuelto, limpiando la metadata de resolución
    pub async fn reopen(&self, id: Uuid) -> Result<Incident, AppError> {
        let incident = sqlx::query_as::<_, Incident>(
            r#"
            UPDATE incidents
            SET status = 'open', resolved_by = NULL, resolved_at = NULL, resolution_notes = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(incident)
    }

    /// Borrado auditado e irreversible de un incidente
    ///
    /// Mismo patrón que el borrado de rondas: auditoría antes del commit,
    /// confirmación legible al llamador.
    pub async fn delete_with_audit(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
    ) -> Result<String, AppError> {
        let mut tx = self.pool.begin().await?;

        audit_repository::record_in_tx(&mut tx, "delete_incident", id, admin_id, admin_name)
            .await?;

        let deleted = sqlx::query("DELETE FROM incidents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Incident '{}' not found", id)));
        }

        tx.commit().await?;

        tracing::info!("Incident {} deleted by admin {} ({})", id, admin_name, admin_id);
        Ok(format!(
            "Incident {} was permanently deleted by {}",
            id, admin_name
        ))
    }

    /// Verificar el estado actual antes de una transición
    pub async fn current_status(&self, id: Uuid) -> Result<IncidentStatus, AppError> {
        let incident = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Incident '{}' not found", id)))?;
        Ok(incident.status)
    }
}
