//! Canal de escalamiento de incidentes
//!
//! Máquina de estados secundaria para reportes de anomalía, ligada a una
//! ronda o independiente vía el fast-path de emergencia. El fast-path
//! evita la validación de referencia a ronda con la identidad centinela
//! y siempre entra con prioridad crítica y tipo emergencia.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::incident::{
    Incident, IncidentPriority, IncidentStatus, IncidentType, NO_ROUND,
};
use crate::models::user::UserRole;
use crate::repositories::{IncidentRepository, RoundRepository, RoundStore};
use crate::utils::errors::{AppError, TransitionError};
use crate::utils::geo::LatLng;

/// Coordenada centinela cuando la geolocalización no está disponible
///
/// Punto débil conocido: un reporte de emergencia sin posición queda en
/// (0,0) en lugar de descartarse, porque llegar rápido importa más que
/// llegar ubicado.
pub const FALLBACK_POSITION: LatLng = LatLng { lat: 0.0, lng: 0.0 };

/// Borrador de incidente listo para persistir
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDraft {
    pub round_id: Uuid,
    pub incident_type: IncidentType,
    pub priority: IncidentPriority,
    pub status: IncidentStatus,
    pub description: Option<String>,
    pub position: LatLng,
}

impl IncidentDraft {
    /// Creación estándar: requiere referencia a ronda existente
    pub fn standard(
        round_id: Uuid,
        incident_type: IncidentType,
        priority: IncidentPriority,
        description: Option<String>,
        position: Option<LatLng>,
    ) -> Self {
        Self {
            round_id,
            incident_type,
            priority,
            status: IncidentStatus::Open,
            description,
            position: position.unwrap_or(FALLBACK_POSITION),
        }
    }

    /// Fast-path de emergencia: sin ronda, siempre crítico
    pub fn emergency(description: Option<String>, position: Option<LatLng>) -> Self {
        Self {
            round_id: NO_ROUND,
            incident_type: IncidentType::Emergency,
            priority: IncidentPriority::Critical,
            status: IncidentStatus::Open,
            description,
            position: position.unwrap_or(FALLBACK_POSITION),
        }
    }
}

pub struct IncidentService {
    incidents: IncidentRepository,
    rounds: RoundRepository,
}

impl IncidentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            incidents: IncidentRepository::new(pool.clone()),
            rounds: RoundRepository::new(pool),
        }
    }

    /// Reportar un incidente contra una ronda activa
    ///
    /// La ronda sigue activa: el incidente es un overlay, no una
    /// transición de estado de la ronda.
    pub async fn report_for_round(
        &self,
        round_id: Uuid,
        incident_type: IncidentType,
        priority: IncidentPriority,
        description: Option<String>,
        position: Option<LatLng>,
    ) -> Result<Incident, AppError> {
        let round = self
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Round '{}' not found", round_id)))?;

        if !round.is_active() {
            return Err(TransitionError(format!(
                "cannot report an incident on a round in status '{:?}'",
                round.status
            ))
            .into());
        }

        let draft =
            IncidentDraft::standard(round_id, incident_type, priority, description, position);
        self.persist(draft).await
    }

    /// Fast-path de emergencia, sin validación de ronda
    pub async fn report_emergency(
        &self,
        description: Option<String>,
        position: Option<LatLng>,
    ) -> Result<Incident, AppError> {
        let draft = IncidentDraft::emergency(description, position);
        if draft.position == FALLBACK_POSITION {
            tracing::warn!("Emergency incident reported without position, using (0,0)");
        }
        self.persist(draft).await
    }

    async fn persist(&self, draft: IncidentDraft) -> Result<Incident, AppError> {
        let incident = self
            .incidents
            .create(
                draft.round_id,
                draft.incident_type,
                draft.priority,
                draft.description,
                draft.position.lat,
                draft.position.lng,
            )
            .await?;

        tracing::info!(
            "Incident {} reported ({:?}/{:?})",
            incident.id,
            incident.incident_type,
            incident.priority
        );
        Ok(incident)
    }

    pub async fn get(&self, id: Uuid) -> Result<Incident, AppError> {
        self.incidents
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Incident '{}' not found", id)))
    }

    /// Pasar el incidente a investigación
    pub async fn investigate(&self, id: Uuid, investigator_id: Uuid) -> Result<Incident, AppError> {
        let current = self.incidents.current_status(id).await?;
        current.ensure_transition(IncidentStatus::Investigating)?;
        self.incidents.mark_investigating(id, investigator_id).await
    }

    /// Resolver un incidente en investigación
    pub async fn resolve(
        &self,
        id: Uuid,
        resolver_id: Uuid,
        resolution_notes: Option<String>,
    ) -> Result<Incident, AppError> {
        let current = self.incidents.current_status(id).await?;
        current.ensure_transition(IncidentStatus::Resolved)?;
        self.incidents.mark_resolved(id, resolver_id, resolution_notes).await
    }

    /// Reabrir un incidente resuelto
    pub async fn reopen(&self, id: Uuid) -> Result<Incident, AppError> {
        let current = self.incidents.current_status(id).await?;
        current.ensure_transition(IncidentStatus::Open)?;
        self.incidents.reopen(id).await
    }

    /// Borrado auditado, solo administradores
    pub async fn destroy(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        if !role.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can delete incidents".to_string(),
            ));
        }

        self.incidents.delete_with_audit(id, admin_id, admin_name).await
    }
}
