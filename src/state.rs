//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: pool de base de datos, configuración,
//! relay de escaneo y el feed en vivo de muestras de traza.

use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::acquisition::relay::ScanRelay;
use crate::config::environment::EnvironmentConfig;
use crate::services::trace_recorder::TraceSample;

/// Capacidad del canal de traza en vivo; los monitores lentos pierden
/// muestras viejas en lugar de frenar la ingesta
const TRACE_LIVE_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub scan_relay: ScanRelay,
    pub trace_live: broadcast::Sender<TraceSample>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let (trace_live, _) = broadcast::channel(TRACE_LIVE_CAPACITY);
        Self {
            pool,
            config,
            scan_relay: ScanRelay::new(),
            trace_live,
        }
    }

    /// Suscribirse al feed en vivo de muestras de traza
    pub fn subscribe_trace(&self) -> broadcast::Receiver<TraceSample> {
        self.trace_live.subscribe()
    }
}
