//! Controlador de ciclo de vida de rondas
//!
//! Máquina de estados `pending → active → completed`. Una transición
//! inválida falla con error de transición y no muta nada; un fallo de
//! persistencia se reporta al llamador y la operación se considera no
//! aplicada, sin reintento automático.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::round::Round;
use crate::models::user::UserRole;
use crate::models::vehicle::VehicleType;
use crate::models::visit::{CheckpointVisit, VisitStatus};
use crate::repositories::{
    CheckpointRepository, CheckpointStore, RoundRepository, RoundStore, VisitRepository,
    VisitStore,
};
use crate::services::verification_service::VerificationService;
use crate::utils::errors::AppError;
use crate::utils::geo::LatLng;

pub struct RoundService {
    rounds: Arc<dyn RoundStore>,
    visits: Arc<dyn VisitStore>,
    verification: VerificationService,
}

impl RoundService {
    pub fn new(pool: PgPool) -> Self {
        let visits: Arc<dyn VisitStore> = Arc::new(VisitRepository::new(pool.clone()));
        Self {
            rounds: Arc::new(RoundRepository::new(pool.clone())),
            verification: VerificationService::with_stores(
                Arc::new(CheckpointRepository::new(pool)),
                visits.clone(),
            ),
            visits,
        }
    }

    pub fn with_stores(
        rounds: Arc<dyn RoundStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        visits: Arc<dyn VisitStore>,
    ) -> Self {
        Self {
            rounds,
            verification: VerificationService::with_stores(checkpoints, visits.clone()),
            visits,
        }
    }

    /// Crear una ronda en estado pending
    pub async fn create(
        &self,
        client_id: Uuid,
        operator_id: Uuid,
        vehicle_id: Option<Uuid>,
        vehicle_type: VehicleType,
    ) -> Result<Round, AppError> {
        let round = self
            .rounds
            .create(client_id, operator_id, vehicle_id, vehicle_type)
            .await?;
        tracing::info!("Round {} created for client {}", round.id, client_id);
        Ok(round)
    }

    pub async fn get(&self, id: Uuid) -> Result<Round, AppError> {
        self.rounds
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Round '{}' not found", id)))
    }

    /// Ronda activa del operador, para retomar tras reinicio del dispositivo
    pub async fn active_for_operator(&self, operator_id: Uuid) -> Result<Option<Round>, AppError> {
        self.rounds.find_active_by_operator(operator_id).await
    }

    /// Iniciar la ronda
    ///
    /// Requiere estado pending y lectura inicial de odómetro. Si el
    /// dispositivo entregó posición, el punto inicial de traza se escribe
    /// junto con la activación: o ambas cosas quedan, o ninguna.
    pub async fn start(
        &self,
        id: Uuid,
        start_odometer: Decimal,
        start_position: Option<LatLng>,
    ) -> Result<Round, AppError> {
        let round = self.get(id).await?;
        round.ensure_can_start()?;

        let round = self
            .rounds
            .mark_started(id, start_odometer, Utc::now(), start_position)
            .await?;

        tracing::info!("Round {} started at odometer {}", id, start_odometer);
        Ok(round)
    }

    /// Registrar la visita de un checkpoint - no cambia el estado
    pub async fn record_visit(
        &self,
        id: Uuid,
        raw_token: &str,
        device_position: Option<LatLng>,
        source: VisitStatus,
    ) -> Result<CheckpointVisit, AppError> {
        let round = self.get(id).await?;
        self.verification
            .verify(&round, raw_token, device_position, source)
            .await
    }

    /// Visitas registradas de la ronda, en orden temporal
    pub async fn visits(&self, id: Uuid) -> Result<Vec<CheckpointVisit>, AppError> {
        self.visits.find_by_round(id).await
    }

    /// Finalizar la ronda
    ///
    /// Requiere estado active (el overlay de incidente no bloquea) y
    /// odómetro final no menor que el inicial.
    pub async fn finish(&self, id: Uuid, end_odometer: Decimal) -> Result<Round, AppError> {
        let round = self.get(id).await?;
        round.ensure_can_finish(end_odometer)?;

        let round = self
            .rounds
            .mark_finished(id, end_odometer, Utc::now())
            .await?;

        tracing::info!("Round {} completed at odometer {}", id, end_odometer);
        Ok(round)
    }

    /// Destruir la ronda de forma auditada, solo administradores
    ///
    /// Irreversible: la cascada elimina visitas, puntos de ruta e
    /// incidentes de la ronda junto con la ronda misma.
    pub async fn destroy(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        if !role.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can delete rounds".to_string(),
            ));
        }

        self.rounds.delete_with_audit(id, admin_id, admin_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::round::RoundStatus;
    use crate::repositories::testing::{
        InMemoryCheckpoints, InMemoryRoutePoints, InMemoryRounds, InMemoryVisits,
    };

    struct Fixture {
        service: RoundService,
        rounds: Arc<InMemoryRounds>,
        route_points: Arc<InMemoryRoutePoints>,
    }

    fn fixture() -> Fixture {
        let route_points = Arc::new(InMemoryRoutePoints::default());
        let rounds = Arc::new(InMemoryRounds::new(route_points.clone()));
        let service = RoundService::with_stores(
            rounds.clone(),
            Arc::new(InMemoryCheckpoints::default()),
            Arc::new(InMemoryVisits::default()),
        );
        Fixture {
            service,
            rounds,
            route_points,
        }
    }

    async fn pending_round(fx: &Fixture) -> Round {
        fx.service
            .create(Uuid::new_v4(), Uuid::new_v4(), None, VehicleType::Car)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_activates_round_and_opens_trace() {
        let fx = fixture();
        let round = pending_round(&fx).await;

        let started = fx
            .service
            .start(
                round.id,
                Decimal::from(1000),
                Some(LatLng::new(-23.55, -46.63)),
            )
            .await
            .unwrap();

        assert_eq!(started.status, RoundStatus::Active);
        assert_eq!(started.start_odometer, Some(Decimal::from(1000)));

        let trace = fx.route_points.rows();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].round_id, round.id);
        assert_eq!(trace[0].lat, -23.55);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_round_untouched() {
        let fx = fixture();
        let round = pending_round(&fx).await;
        fx.rounds.fail_next_start();

        let result = fx
            .service
            .start(
                round.id,
                Decimal::from(1000),
                Some(LatLng::new(-23.55, -46.63)),
            )
            .await;
        assert!(result.is_err());

        // ni activación a medias ni punto de traza huérfano
        let after = fx.rounds.snapshot(round.id).unwrap();
        assert_eq!(after.status, RoundStatus::Pending);
        assert_eq!(after.start_odometer, None);
        assert!(fx.route_points.is_empty());
    }

    #[tokio::test]
    async fn test_start_requires_pending() {
        let fx = fixture();
        let round = pending_round(&fx).await;

        fx.service
            .start(round.id, Decimal::from(1000), None)
            .await
            .unwrap();

        let again = fx.service.start(round.id, Decimal::from(1001), None).await;
        assert!(matches!(again, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_full_lifecycle_reaches_completed() {
        let fx = fixture();
        let round = pending_round(&fx).await;

        fx.service
            .start(round.id, Decimal::from(1000), None)
            .await
            .unwrap();
        let finished = fx
            .service
            .finish(round.id, Decimal::from(1120))
            .await
            .unwrap();

        assert_eq!(finished.status, RoundStatus::Completed);
        assert_eq!(finished.end_odometer, Some(Decimal::from(1120)));
    }

    #[tokio::test]
    async fn test_destroy_requires_admin_role() {
        let fx = fixture();
        let round = pending_round(&fx).await;

        let result = fx
            .service
            .destroy(round.id, Uuid::new_v4(), "Bruno", UserRole::Operator)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(fx.rounds.snapshot(round.id).is_some());
        assert!(fx.rounds.audit_entries().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_writes_audit_and_names_admin() {
        let fx = fixture();
        let round = pending_round(&fx).await;
        let admin_id = Uuid::new_v4();

        let confirmation = fx
            .service
            .destroy(round.id, admin_id, "Carla", UserRole::Admin)
            .await
            .unwrap();

        // la confirmación nombra a la ronda y al admin que la borró
        assert!(confirmation.contains(&round.id.to_string()));
        assert!(confirmation.contains("Carla"));

        let audit = fx.rounds.audit_entries();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "delete_round");
        assert_eq!(audit[0].target_id, round.id);
        assert_eq!(audit[0].admin_id, admin_id);
        assert_eq!(audit[0].admin_name, "Carla");

        assert!(fx.rounds.snapshot(round.id).is_none());
    }
}
