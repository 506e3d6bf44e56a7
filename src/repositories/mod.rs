//! Repositorios de persistencia
//!
//! Un repositorio por almacén de registros, construido desde el pool de
//! PostgreSQL. Las escrituras son fire-once: un fallo se reporta al
//! llamador y la operación se considera no aplicada, sin reintentos
//! automáticos. Cada almacén expone su contrato como trait para que los
//! servicios puedan ejercitarse contra implementaciones en memoria.

pub mod audit_repository;
pub mod checkpoint_repository;
pub mod incident_repository;
pub mod round_repository;
pub mod route_point_repository;
pub mod visit_repository;

#[cfg(test)]
pub mod testing;

pub use checkpoint_repository::{CheckpointRepository, CheckpointStore};
pub use incident_repository::IncidentRepository;
pub use round_repository::{RoundRepository, RoundStore};
pub use route_point_repository::{RoutePointRepository, RoutePointStore};
pub use visit_repository::{VisitRepository, VisitStore};
