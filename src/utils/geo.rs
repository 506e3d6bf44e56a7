//! Cálculo de distancias geográficas
//!
//! Distancia de círculo máximo (fórmula de haversine) sobre una esfera
//! con el radio terrestre de 6371 km.

/// Radio terrestre en kilómetros
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Par de coordenadas GPS en grados decimales
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Construir desde componentes opcionales; requiere ambos presentes
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// Distancia haversine entre dos puntos, en kilómetros
///
/// Simétrica (`d(a,b) == d(b,a)`) y nula para puntos idénticos.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Distancia total de una traza ordenada de puntos, en kilómetros
///
/// Suma las distancias entre puntos consecutivos. Trazas con menos de
/// dos puntos tienen distancia cero.
pub fn trace_distance_km(points: &[LatLng]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}
