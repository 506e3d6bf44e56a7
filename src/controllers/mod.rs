//! Controllers de la API
//!
//! Capa fina entre las rutas y los servicios: valida requests, arma
//! responses y traduce identidades autenticadas a argumentos de dominio.

pub mod incident_controller;
pub mod round_controller;
pub mod scan_controller;

pub use incident_controller::IncidentController;
pub use round_controller::RoundController;
pub use scan_controller::ScanController;
