//! Tipo de vehículo de la ronda
//!
//! Variantes cerradas con lookup exhaustivo de consumo promedio, para que
//! una categoría no reconocida nunca llegue al cálculo de combustible.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Tipo de vehículo - mapea al ENUM vehicle_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Motorcycle,
    OnFoot,
}

impl VehicleType {
    /// Consumo promedio en km por litro
    ///
    /// Constantes fijas de estimación (car: 10 km/L, motorcycle: 30 km/L);
    /// una ronda a pie no tiene estimación de combustible.
    pub fn avg_consumption_km_per_liter(&self) -> Option<Decimal> {
        match self {
            VehicleType::Car => Some(Decimal::from(10)),
            VehicleType::Motorcycle => Some(Decimal::from(30)),
            VehicleType::OnFoot => None,
        }
    }
}
