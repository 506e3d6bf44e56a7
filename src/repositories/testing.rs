//! Almacenes en memoria para tests de servicios
//!
//! Implementan los mismos contratos que los repositorios de PostgreSQL,
//! incluidas las restricciones únicas del esquema, sin tocar el pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::checkpoint::Checkpoint;
use crate::models::round::{Round, RoundStatus};
use crate::models::route_point::RoutePoint;
use crate::models::vehicle::VehicleType;
use crate::models::visit::{CheckpointVisit, VisitStatus};
use crate::repositories::checkpoint_repository::CheckpointStore;
use crate::repositories::round_repository::{self, RoundStore};
use crate::repositories::route_point_repository::RoutePointStore;
use crate::repositories::visit_repository::VisitStore;
use crate::utils::errors::{AppError, VerificationError};
use crate::utils::geo::LatLng;

/// Checkpoints fijos de un cliente
#[derive(Default)]
pub struct InMemoryCheckpoints {
    items: Mutex<Vec<Checkpoint>>,
}

impl InMemoryCheckpoints {
    pub fn with(items: Vec<Checkpoint>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpoints {
    async fn find_by_client_and_code(
        &self,
        client_id: Uuid,
        code: &str,
    ) -> Result<Option<Checkpoint>, AppError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.client_id == client_id && c.code == code)
            .cloned())
    }

    async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Checkpoint>, AppError> {
        let mut checkpoints: Vec<Checkpoint> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .collect();
        checkpoints.sort_by_key(|c| c.order_index);
        Ok(checkpoints)
    }
}

/// Visitas con la misma unicidad que el esquema:
/// (round_id, checkpoint_id) a lo sumo una vez
#[derive(Default)]
pub struct InMemoryVisits {
    rows: Mutex<Vec<CheckpointVisit>>,
    skip_exists: AtomicBool,
}

impl InMemoryVisits {
    /// Variante donde el pre-chequeo de existencia nunca ve la visita,
    /// como en dos envíos simultáneos; solo la unicidad de `create`
    /// sostiene la política
    pub fn without_exists_check() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            skip_exists: AtomicBool::new(true),
        }
    }

    pub fn rows(&self) -> Vec<CheckpointVisit> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisitStore for InMemoryVisits {
    async fn exists(&self, round_id: Uuid, checkpoint_id: Uuid) -> Result<bool, AppError> {
        if self.skip_exists.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|v| v.round_id == round_id && v.checkpoint_id == checkpoint_id))
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
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|v| v.round_id == round_id && v.checkpoint_id == checkpoint_id)
        {
            return Err(AppError::Verification(VerificationError::DuplicateVisit));
        }

        let visit = CheckpointVisit {
            id: Uuid::new_v4(),
            round_id,
            checkpoint_id,
            visit_time,
            lat,
            lng,
            status,
        };
        rows.push(visit.clone());
        Ok(visit)
    }

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<CheckpointVisit>, AppError> {
        let mut visits: Vec<CheckpointVisit> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.round_id == round_id)
            .cloned()
            .collect();
        visits.sort_by_key(|v| v.visit_time);
        Ok(visits)
    }
}

/// Traza con descarte idempotente de muestras duplicadas exactas
#[derive(Default)]
pub struct InMemoryRoutePoints {
    rows: Mutex<Vec<RoutePoint>>,
}

impl InMemoryRoutePoints {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> Vec<RoutePoint> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutePointStore for InMemoryRoutePoints {
    async fn append(
        &self,
        round_id: Uuid,
        lat: f64,
        lng: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Option<RoutePoint>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let duplicate = rows.iter().any(|p| {
            p.round_id == round_id && p.recorded_at == recorded_at && p.lat == lat && p.lng == lng
        });
        if duplicate {
            return Ok(None);
        }

        let point = RoutePoint {
            id: Uuid::new_v4(),
            round_id,
            lat,
            lng,
            recorded_at,
        };
        rows.push(point.clone());
        Ok(Some(point))
    }

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<RoutePoint>, AppError> {
        let mut points: Vec<RoutePoint> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.round_id == round_id)
            .cloned()
            .collect();
        points.sort_by_key(|p| p.recorded_at);
        Ok(points)
    }
}

/// Registro de auditoría que dejó un borrado
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: String,
    pub target_id: Uuid,
    pub admin_id: Uuid,
    pub admin_name: String,
}

/// Rondas con el mismo contrato transaccional que el repositorio real:
/// `mark_started` no deja estado parcial y el borrado escribe auditoría
pub struct InMemoryRounds {
    rows: Mutex<Vec<Round>>,
    route_points: Arc<InMemoryRoutePoints>,
    fail_next_start: AtomicBool,
    audit: Mutex<Vec<AuditEntry>>,
}

impl InMemoryRounds {
    pub fn new(route_points: Arc<InMemoryRoutePoints>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            route_points,
            fail_next_start: AtomicBool::new(false),
            audit: Mutex::new(Vec::new()),
        }
    }

    /// Inyectar un fallo de escritura en el próximo `mark_started`
    pub fn fail_next_start(&self) {
        self.fail_next_start.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Round> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoundStore for InMemoryRounds {
    async fn create(
        &self,
        client_id: Uuid,
        operator_id: Uuid,
        vehicle_id: Option<Uuid>,
        vehicle_type: VehicleType,
    ) -> Result<Round, AppError> {
        let round = Round {
            id: Uuid::new_v4(),
            client_id,
            operator_id,
            vehicle_id,
            vehicle_type,
            status: RoundStatus::Pending,
            start_time: None,
            end_time: None,
            start_odometer: None,
            end_odometer: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(round.clone());
        Ok(round)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Round>, AppError> {
        Ok(self.snapshot(id))
    }

    async fn find_active_by_operator(
        &self,
        operator_id: Uuid,
    ) -> Result<Option<Round>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operator_id == operator_id && r.is_active())
            .max_by_key(|r| r.start_time)
            .cloned())
    }

    async fn mark_started(
        &self,
        id: Uuid,
        start_odometer: Decimal,
        start_time: DateTime<Utc>,
        initial_position: Option<LatLng>,
    ) -> Result<Round, AppError> {
        if self.fail_next_start.swap(false, Ordering::SeqCst) {
            // ninguna de las dos escrituras se aplica, como en la
            // transacción real
            return Err(AppError::Internal("injected storage failure".to_string()));
        }

        let updated = {
            let mut rows = self.rows.lock().unwrap();
            let round = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(sqlx::Error::RowNotFound)?;
            round.status = RoundStatus::Active;
            round.start_time = Some(start_time);
            round.start_odometer = Some(start_odometer);
            round.clone()
        };

        if let Some(position) = initial_position {
            self.route_points
                .append(id, position.lat, position.lng, start_time)
                .await?;
        }

        Ok(updated)
    }

    async fn mark_finished(
        &self,
        id: Uuid,
        end_odometer: Decimal,
        end_time: DateTime<Utc>,
    ) -> Result<Round, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let round = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        round.status = RoundStatus::Completed;
        round.end_time = Some(end_time);
        round.end_odometer = Some(end_odometer);
        Ok(round.clone())
    }

    async fn delete_with_audit(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
    ) -> Result<String, AppError> {
        {
            let mut rows = self.rows.lock().unwrap();
            let position = rows
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| AppError::NotFound(format!("Round '{}' not found", id)))?;

            self.audit.lock().unwrap().push(AuditEntry {
                action: "delete_round".to_string(),
                target_id: id,
                admin_id,
                admin_name: admin_name.to_string(),
            });

            rows.remove(position);
        }

        self.route_points
            .rows
            .lock()
            .unwrap()
            .retain(|p| p.round_id != id);

        Ok(round_repository::deletion_confirmation(id, admin_name))
    }
}
