//! Modelo de Round
//!
//! Una ronda es una asignación de patrulla de un operador contra un sitio
//! de cliente, desde el inicio hasta la finalización. La legalidad de las
//! transiciones de estado vive aquí como lógica pura, sin persistencia.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::vehicle::VehicleType;
use crate::utils::errors::TransitionError;

/// Estado de la ronda - mapea al ENUM round_status
///
/// `Incident` existe por compatibilidad con el esquema; reportar un
/// incidente NO fuerza este estado: la ronda sigue `Active` y el
/// incidente es un overlay observable por su propio registro.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "round_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Pending,
    Active,
    Completed,
    Incident,
}

/// Round principal - mapea exactamente a la tabla rounds
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Round {
    pub id: Uuid,
    pub client_id: Uuid,
    pub operator_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
    pub status: RoundStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_odometer: Option<Decimal>,
    pub end_odometer: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Round {
    /// Verificar que la ronda puede iniciarse
    ///
    /// Solo una ronda `Pending` puede pasar a `Active`.
    pub fn ensure_can_start(&self) -> Result<(), TransitionError> {
        match self.status {
            RoundStatus::Pending => Ok(()),
            other => Err(TransitionError(format!(
                "cannot start round in status '{:?}'",
                other
            ))),
        }
    }

    /// Verificar que la ronda puede finalizarse con el odómetro dado
    ///
    /// Requiere estado `Active` (el overlay de incidente no bloquea el
    /// cierre) y odómetro final no menor que el inicial.
    pub fn ensure_can_finish(&self, end_odometer: Decimal) -> Result<(), TransitionError> {
        match self.status {
            RoundStatus::Active | RoundStatus::Incident => {}
            other => {
                return Err(TransitionError(format!(
                    "cannot finish round in status '{:?}'",
                    other
                )))
            }
        }

        if let Some(start) = self.start_odometer {
            if end_odometer < start {
                return Err(TransitionError(format!(
                    "end odometer {} is lower than start odometer {}",
                    end_odometer, start
                )));
            }
        }

        Ok(())
    }

    /// Verificar que se puede registrar actividad (visita o incidente)
    pub fn is_active(&self) -> bool {
        matches!(self.status, RoundStatus::Active | RoundStatus::Incident)
    }

    /// Verificar que la ronda acepta muestras de traza
    ///
    /// Solo una ronda en curso suma puntos a su recorrido; una muestra
    /// contra una ronda pendiente o completada se rechaza.
    pub fn ensure_trace_attachable(&self) -> Result<(), TransitionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TransitionError(format!(
                "cannot attach trace samples to a round in status '{:?}'",
                self.status
            )))
        }
    }

    /// Distancia por odómetro (`end - start`), si ambas lecturas existen
    ///
    /// Medida independiente de la traza GPS; las dos cifras no se
    /// reconcilian y pueden divergir.
    pub fn odometer_distance(&self) -> Option<Decimal> {
        match (self.start_odometer, self.end_odometer) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_with_status(status: RoundStatus) -> Round {
        Round {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            operator_id: Uuid::new_v4(),
            vehicle_id: None,
            vehicle_type: VehicleType::Car,
            status,
            start_time: None,
            end_time: None,
            start_odometer: None,
            end_odometer: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_start_requires_pending() {
        assert!(round_with_status(RoundStatus::Pending).ensure_can_start().is_ok());
        assert!(round_with_status(RoundStatus::Active).ensure_can_start().is_err());
        assert!(round_with_status(RoundStatus::Completed).ensure_can_start().is_err());
    }

    #[test]
    fn test_finish_requires_active() {
        let mut round = round_with_status(RoundStatus::Pending);
        assert!(round.ensure_can_finish(Decimal::from(100)).is_err());
        // el estado no cambia por un intento fallido
        assert_eq!(round.status, RoundStatus::Pending);

        round.status = RoundStatus::Active;
        assert!(round.ensure_can_finish(Decimal::from(100)).is_ok());

        round.status = RoundStatus::Completed;
        assert!(round.ensure_can_finish(Decimal::from(100)).is_err());
    }

    #[test]
    fn test_finish_with_incident_overlay_is_allowed() {
        let round = round_with_status(RoundStatus::Incident);
        assert!(round.ensure_can_finish(Decimal::from(100)).is_ok());
    }

    #[test]
    fn test_finish_rejects_decreasing_odometer() {
        let mut round = round_with_status(RoundStatus::Active);
        round.start_odometer = Some(Decimal::from(1000));
        assert!(round.ensure_can_finish(Decimal::from(999)).is_err());
        assert!(round.ensure_can_finish(Decimal::from(1000)).is_ok());
        assert!(round.ensure_can_finish(Decimal::from(1120)).is_ok());
    }

    #[test]
    fn test_trace_samples_require_round_in_progress() {
        assert!(round_with_status(RoundStatus::Active)
            .ensure_trace_attachable()
            .is_ok());
        assert!(round_with_status(RoundStatus::Incident)
            .ensure_trace_attachable()
            .is_ok());
        assert!(round_with_status(RoundStatus::Pending)
            .ensure_trace_attachable()
            .is_err());
        assert!(round_with_status(RoundStatus::Completed)
            .ensure_trace_attachable()
            .is_err());
    }

    #[test]
    fn test_odometer_distance() {
        let mut round = round_with_status(RoundStatus::Completed);
        assert_eq!(round.odometer_distance(), None);

        round.start_odometer = Some(Decimal::from(1000));
        round.end_odometer = Some(Decimal::from(1120));
        assert_eq!(round.odometer_distance(), Some(Decimal::from(120)));
    }
}
