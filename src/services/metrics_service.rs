//! Reconstrucción de ruta y métricas
//!
//! A partir de la traza ordenada de una ronda completada deriva la
//! distancia GPS (haversine), la duración y la estimación de
//! combustible. La distancia por odómetro es una medida independiente
//! más simple; las dos cifras no se reconcilian y pueden divergir.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::round::Round;
use crate::models::route_point::RoutePoint;
use crate::repositories::{RoundRepository, RoundStore, RoutePointRepository, RoutePointStore};
use crate::utils::errors::AppError;
use crate::utils::geo::{trace_distance_km, LatLng};

/// Métricas derivadas de una ronda
#[derive(Debug, Clone, Serialize)]
pub struct RoundMetrics {
    /// Suma de distancias haversine entre puntos consecutivos de la traza
    pub gps_distance_km: f64,
    /// `end_odometer - start_odometer`, si ambas lecturas existen
    pub odometer_distance_km: Option<Decimal>,
    /// Duración formateada en horas/minutos, "N/A" sin timestamps
    pub duration: String,
    /// Litros estimados según el consumo promedio del tipo de vehículo
    pub fuel_used_liters: Option<Decimal>,
    /// Costo estimado al precio por litro configurado - es una
    /// estimación de display, no una medición de consumo real
    pub estimated_cost: Option<Decimal>,
}

/// Formatear la duración entre inicio y fin como horas/minutos
pub fn format_duration(
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
) -> String {
    match (start_time, end_time) {
        (Some(start), Some(end)) => {
            let minutes = (end - start).num_minutes().max(0);
            format!("{}h {:02}min", minutes / 60, minutes % 60)
        }
        _ => "N/A".to_string(),
    }
}

/// Calcular las métricas de una ronda a partir de su traza
///
/// El combustible se estima sobre la distancia de odómetro cuando ambas
/// lecturas existen; con traza GPS dispersa o sin odómetro se usa la
/// distancia haversine. Una ronda a pie no produce estimación.
pub fn compute_metrics(
    round: &Round,
    points: &[RoutePoint],
    fuel_price_per_liter: Decimal,
) -> RoundMetrics {
    let positions: Vec<LatLng> = points
        .iter()
        .map(|p| LatLng::new(p.lat, p.lng))
        .collect();
    let gps_distance_km = trace_distance_km(&positions);

    let odometer_distance_km = round.odometer_distance();

    let fuel_distance = odometer_distance_km
        .or_else(|| Decimal::from_f64_retain(gps_distance_km))
        .unwrap_or(Decimal::ZERO);

    let (fuel_used_liters, estimated_cost) =
        match round.vehicle_type.avg_consumption_km_per_liter() {
            Some(consumption) if !consumption.is_zero() => {
                let liters = (fuel_distance / consumption).round_dp(2);
                let cost = (liters * fuel_price_per_liter).round_dp(2);
                (Some(liters), Some(cost))
            }
            _ => (None, None),
        };

    RoundMetrics {
        gps_distance_km,
        odometer_distance_km,
        duration: format_duration(round.start_time, round.end_time),
        fuel_used_liters,
        estimated_cost,
    }
}

pub struct MetricsService {
    rounds: RoundRepository,
    route_points: RoutePointRepository,
}

impl MetricsService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rounds: RoundRepository::new(pool.clone()),
            route_points: RoutePointRepository::new(pool),
        }
    }

    /// Métricas de la ronda, consumiendo la traza completa
    pub async fn round_metrics(
        &self,
        round_id: Uuid,
        fuel_price_per_liter: Decimal,
    ) -> Result<RoundMetrics, AppError> {
        let round = self
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Round '{}' not found", round_id)))?;

        let points = self.route_points.find_by_round(round_id).await?;

        Ok(compute_metrics(&round, &points, fuel_price_per_liter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::round::RoundStatus;
    use crate::models::vehicle::VehicleType;
    use chrono::TimeZone;

    fn completed_round(vehicle_type: VehicleType) -> Round {
        Round {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            operator_id: Uuid::new_v4(),
            vehicle_id: None,
            vehicle_type,
            status: RoundStatus::Completed,
            start_time: Some(Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2024, 3, 10, 22, 35, 0).unwrap()),
            start_odometer: Some(Decimal::from(1000)),
            end_odometer: Some(Decimal::from(1120)),
            created_at: Utc::now(),
        }
    }

    fn point(round_id: Uuid, lat: f64, lng: f64, secs: i64) -> RoutePoint {
        RoutePoint {
            id: Uuid::new_v4(),
            round_id,
            lat,
            lng,
            recorded_at: Utc.timestamp_opt(1_710_100_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_car_fuel_scenario() {
        // 120 km por odómetro, auto a 10 km/L, litro a 5.50
        let round = completed_round(VehicleType::Car);
        let price: Decimal = "5.50".parse().unwrap();

        let metrics = compute_metrics(&round, &[], price);

        assert_eq!(metrics.odometer_distance_km, Some(Decimal::from(120)));
        assert_eq!(metrics.fuel_used_liters, Some(Decimal::from(12)));
        assert_eq!(metrics.estimated_cost, Some("66.00".parse().unwrap()));
    }

    #[test]
    fn test_motorcycle_uses_its_own_consumption() {
        let round = completed_round(VehicleType::Motorcycle);
        let price: Decimal = "5.50".parse().unwrap();

        let metrics = compute_metrics(&round, &[], price);

        assert_eq!(metrics.fuel_used_liters, Some(Decimal::from(4)));
        assert_eq!(metrics.estimated_cost, Some(Decimal::from(22)));
    }

    #[test]
    fn test_on_foot_has_no_fuel_estimate() {
        let round = completed_round(VehicleType::OnFoot);
        let metrics = compute_metrics(&round, &[], "5.50".parse().unwrap());

        assert_eq!(metrics.fuel_used_liters, None);
        assert_eq!(metrics.estimated_cost, None);
    }

    #[test]
    fn test_gps_distance_from_trace() {
        let round = completed_round(VehicleType::Car);
        let points = vec![
            point(round.id, -23.550520, -46.633308, 0),
            point(round.id, -23.561684, -46.656139, 180),
        ];

        let metrics = compute_metrics(&round, &points, "5.50".parse().unwrap());

        // ~2.68 km entre los dos puntos, independiente del orden
        assert!((metrics.gps_distance_km - 2.68).abs() < 0.05);
        // las dos distancias divergen y no se reconcilian
        assert_eq!(metrics.odometer_distance_km, Some(Decimal::from(120)));
    }

    #[test]
    fn test_duration_formatting() {
        let round = completed_round(VehicleType::Car);
        let metrics = compute_metrics(&round, &[], Decimal::ONE);
        assert_eq!(metrics.duration, "2h 35min");
    }

    #[test]
    fn test_duration_without_timestamps_is_na() {
        let mut round = completed_round(VehicleType::Car);
        round.end_time = None;
        let metrics = compute_metrics(&round, &[], Decimal::ONE);
        assert_eq!(metrics.duration, "N/A");

        round.start_time = None;
        let metrics = compute_metrics(&round, &[], Decimal::ONE);
        assert_eq!(metrics.duration, "N/A");
    }

    #[test]
    fn test_fuel_falls_back_to_gps_distance_without_odometer() {
        let mut round = completed_round(VehicleType::Car);
        round.start_odometer = None;
        round.end_odometer = None;
        let points = vec![
            point(round.id, -23.550520, -46.633308, 0),
            point(round.id, -23.561684, -46.656139, 180),
        ];

        let metrics = compute_metrics(&round, &points, "5.50".parse().unwrap());

        let liters = metrics.fuel_used_liters.unwrap();
        // ~2.68 km / 10 km/L da ~0.27 L
        assert!(liters > "0.2".parse().unwrap() && liters < "0.3".parse().unwrap());
    }
}
