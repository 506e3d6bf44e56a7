//! Modelos de dominio
//!
//! Structs que mapean al schema PostgreSQL más la lógica pura de
//! máquinas de estado (ronda e incidente).

pub mod checkpoint;
pub mod incident;
pub mod round;
pub mod route_point;
pub mod user;
pub mod vehicle;
pub mod visit;

pub use checkpoint::Checkpoint;
pub use incident::{Incident, IncidentPriority, IncidentStatus, IncidentType, NO_ROUND};
pub use round::{Round, RoundStatus};
pub use route_point::RoutePoint;
pub use user::UserRole;
pub use vehicle::VehicleType;
pub use visit::{CheckpointVisit, VisitStatus};
