//! Subsistema de adquisición de código
//!
//! Convierte un código físico (leído por cámara o digitado a mano) en un
//! token normalizado. La cámara se intenta con una escalera descendente
//! de configuraciones; toda falla clasificada degrada a entrada manual.
//! El resultado viaja al flujo solicitante por un relay correlacionado
//! por solicitud.

pub mod camera;
pub mod relay;
pub mod token;

pub use camera::{acquire, ActiveStream, CameraDevice, CameraStream, CaptureProfile, DeviceError};
pub use relay::{RelayError, ScanRelay};
pub use token::{normalize_manual_input, validate_token, CheckpointToken};
