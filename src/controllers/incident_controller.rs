//! Controller de incidentes

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::incident_dto::{
    CreateIncidentRequest, EmergencyIncidentRequest, IncidentResponse, ResolveIncidentRequest,
};
use crate::dto::ApiResponse;
use crate::models::user::UserRole;
use crate::services::incident_service::IncidentService;
use crate::utils::errors::AppError;
use crate::utils::geo::LatLng;

pub struct IncidentController {
    service: IncidentService,
}

impl IncidentController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            service: IncidentService::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateIncidentRequest,
    ) -> Result<ApiResponse<IncidentResponse>, AppError> {
        request.validate()?;

        let position = LatLng::from_parts(request.lat, request.lng);
        let incident = self
            .service
            .report_for_round(
                request.round_id,
                request.incident_type,
                request.priority,
                request.description,
                position,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            incident.into(),
            "Incident reported".to_string(),
        ))
    }

    /// Fast-path de emergencia: prioridad crítica, sin referencia a ronda
    pub async fn create_emergency(
        &self,
        request: EmergencyIncidentRequest,
    ) -> Result<ApiResponse<IncidentResponse>, AppError> {
        request.validate()?;

        let position = LatLng::from_parts(request.lat, request.lng);
        let incident = self
            .service
            .report_emergency(request.description, position)
            .await?;

        Ok(ApiResponse::success_with_message(
            incident.into(),
            "Emergency reported".to_string(),
        ))
    }

    pub async fn get(&self, id: Uuid) -> Result<IncidentResponse, AppError> {
        Ok(self.service.get(id).await?.into())
    }

    pub async fn investigate(
        &self,
        id: Uuid,
        investigator_id: Uuid,
    ) -> Result<ApiResponse<IncidentResponse>, AppError> {
        let incident = self.service.investigate(id, investigator_id).await?;
        Ok(ApiResponse::success_with_message(
            incident.into(),
            "Incident under investigation".to_string(),
        ))
    }

    pub async fn resolve(
        &self,
        id: Uuid,
        resolver_id: Uuid,
        request: ResolveIncidentRequest,
    ) -> Result<ApiResponse<IncidentResponse>, AppError> {
        request.validate()?;

        let incident = self
            .service
            .resolve(id, resolver_id, request.resolution_notes)
            .await?;
        Ok(ApiResponse::success_with_message(
            incident.into(),
            "Incident resolved".to_string(),
        ))
    }

    pub async fn reopen(&self, id: Uuid) -> Result<ApiResponse<IncidentResponse>, AppError> {
        let incident = self.service.reopen(id).await?;
        Ok(ApiResponse::success_with_message(
            incident.into(),
            "Incident reopened".to_string(),
        ))
    }

    pub async fn destroy(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.service.destroy(id, admin_id, admin_name, role).await
    }
}
