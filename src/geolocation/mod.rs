//! Interfaz de geolocalización del dispositivo
//!
//! Lectura única de alta precisión con timeout acotado. La falla de
//! geolocalización nunca es fatal: cada consumidor define su fallback
//! (coordenadas registradas del checkpoint, o la centinela `(0,0)` del
//! fast-path de emergencia).

use std::time::Duration;

use async_trait::async_trait;

use crate::utils::errors::GeolocationError;
use crate::utils::geo::LatLng;

/// Timeout por defecto para una lectura de posición
pub const DEFAULT_POSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Proveedor de posición del dispositivo
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Leer la posición actual en alta precisión
    async fn current_position(&self) -> Result<LatLng, GeolocationError>;
}

/// Leer la posición con un timeout acotado
///
/// Si el proveedor no responde dentro del plazo se devuelve
/// `GeolocationError::Timeout`; el llamador decide el fallback.
pub async fn locate_within(
    geolocator: &dyn Geolocator,
    timeout: Duration,
) -> Result<LatLng, GeolocationError> {
    match tokio::time::timeout(timeout, geolocator.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}

#[cfg(test)]
pub mod testing {
    //! Fakes de geolocalización para tests

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Geolocator fake con respuesta fija y contador de lecturas
    pub struct FixedGeolocator {
        pub position: Result<LatLng, GeolocationError>,
        pub reads: Arc<AtomicUsize>,
    }

    impl FixedGeolocator {
        pub fn at(lat: f64, lng: f64) -> Self {
            Self {
                position: Ok(LatLng::new(lat, lng)),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn denied() -> Self {
            Self {
                position: Err(GeolocationError::PermissionDenied),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Geolocator for FixedGeolocator {
        async fn current_position(&self) -> Result<LatLng, GeolocationError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.position.clone()
        }
    }

    /// Geolocator que nunca responde, para ejercitar el timeout
    pub struct StalledGeolocator;

    #[async_trait]
    impl Geolocator for StalledGeolocator {
        async fn current_position(&self) -> Result<LatLng, GeolocationError> {
            std::future::pending().await
        }
    }
}
