//! Servicios del núcleo
//!
//! Motor de verificación, controlador de ciclo de vida de rondas,
//! grabador de traza, métricas de ruta y canal de incidentes.

pub mod incident_service;
pub mod metrics_service;
pub mod round_service;
pub mod trace_recorder;
pub mod verification_service;

pub use incident_service::IncidentService;
pub use metrics_service::MetricsService;
pub use round_service::RoundService;
pub use trace_recorder::{PersistingTraceSink, TraceRecorder, TraceSample, TraceSink};
pub use verification_service::VerificationService;
