//! Relay de escaneo con correlación por solicitud
//!
//! Canal transitorio que entrega el token escaneado/digitado al flujo
//! que solicitó la adquisición. Cada solicitud registra un `request_id`
//! y el resultado se entrega como `(request_id, token)`, de modo que
//! escaneos concurrentes o secuenciales rápidos no puedan cruzar
//! resultados. Cada slot se consume exactamente una vez; los slots que
//! nadie consume ni cancela vencen por edad.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Tiempo de vida de un slot sin consumir
///
/// Una sesión abandonada (vista cerrada sin cancelar, resultado nunca
/// consultado) no queda viva para siempre: al registrar una solicitud
/// nueva se barren las vencidas.
const SLOT_TTL: Duration = Duration::from_secs(300);

/// Errores del relay de escaneo
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Unknown scan request id")]
    UnknownRequest,

    #[error("Scan result already delivered for this request")]
    AlreadyDelivered,
}

impl From<RelayError> for AppError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::UnknownRequest => AppError::NotFound("scan request not found".to_string()),
            RelayError::AlreadyDelivered => {
                AppError::Conflict("scan result already delivered".to_string())
            }
        }
    }
}

#[derive(Debug)]
enum SlotState {
    Pending,
    Delivered(String),
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    registered_at: Instant,
}

/// Relay compartido de resultados de escaneo
#[derive(Clone, Default)]
pub struct ScanRelay {
    slots: Arc<Mutex<HashMap<Uuid, Slot>>>,
}

impl ScanRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar una nueva solicitud de escaneo
    pub fn register(&self) -> Uuid {
        self.sweep_older_than(SLOT_TTL);

        let request_id = Uuid::new_v4();
        self.slots
            .lock()
            .expect("scan relay lock poisoned")
            .insert(
                request_id,
                Slot {
                    state: SlotState::Pending,
                    registered_at: Instant::now(),
                },
            );
        request_id
    }

    /// Entregar el token para una solicitud registrada
    pub fn deliver(&self, request_id: Uuid, token: String) -> Result<(), RelayError> {
        let mut slots = self.slots.lock().expect("scan relay lock poisoned");
        match slots.get_mut(&request_id) {
            None => Err(RelayError::UnknownRequest),
            Some(slot) => match slot.state {
                SlotState::Delivered(_) => Err(RelayError::AlreadyDelivered),
                SlotState::Pending => {
                    slot.state = SlotState::Delivered(token);
                    Ok(())
                }
            },
        }
    }

    /// Consumir el resultado de una solicitud
    ///
    /// `Ok(None)` mientras el resultado aún no llega; `Ok(Some)` entrega
    /// el token y elimina el slot, de modo que no puede consumirse dos
    /// veces.
    pub fn take(&self, request_id: Uuid) -> Result<Option<String>, RelayError> {
        let mut slots = self.slots.lock().expect("scan relay lock poisoned");
        match slots.get(&request_id).map(|slot| &slot.state) {
            None => Err(RelayError::UnknownRequest),
            Some(SlotState::Pending) => Ok(None),
            Some(SlotState::Delivered(_)) => match slots.remove(&request_id) {
                Some(Slot {
                    state: SlotState::Delivered(token),
                    ..
                }) => Ok(Some(token)),
                _ => Err(RelayError::UnknownRequest),
            },
        }
    }

    /// Descartar una solicitud pendiente cuando su scope termina
    pub fn cancel(&self, request_id: Uuid) {
        self.slots
            .lock()
            .expect("scan relay lock poisoned")
            .remove(&request_id);
    }

    /// Barrer los slots más viejos que `ttl`, entregados o no
    fn sweep_older_than(&self, ttl: Duration) {
        self.slots
            .lock()
            .expect("scan relay lock poisoned")
            .retain(|_, slot| slot.registered_at.elapsed() < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_is_correlated_by_request_id() {
        let relay = ScanRelay::new();
        let first = relay.register();
        let second = relay.register();

        relay.deliver(first, "111111111".to_string()).unwrap();
        relay.deliver(second, "222222222".to_string()).unwrap();

        // cada solicitud recibe su propio token, sin cruce
        assert_eq!(relay.take(second).unwrap(), Some("222222222".to_string()));
        assert_eq!(relay.take(first).unwrap(), Some("111111111".to_string()));
    }

    #[test]
    fn test_take_before_delivery_is_pending() {
        let relay = ScanRelay::new();
        let request = relay.register();
        assert_eq!(relay.take(request).unwrap(), None);
    }

    #[test]
    fn test_slot_is_consumed_exactly_once() {
        let relay = ScanRelay::new();
        let request = relay.register();
        relay.deliver(request, "123456789".to_string()).unwrap();

        assert_eq!(relay.take(request).unwrap(), Some("123456789".to_string()));
        assert_eq!(relay.take(request), Err(RelayError::UnknownRequest));
    }

    #[test]
    fn test_deliver_to_unknown_request_fails() {
        let relay = ScanRelay::new();
        assert_eq!(
            relay.deliver(Uuid::new_v4(), "123456789".to_string()),
            Err(RelayError::UnknownRequest)
        );
    }

    #[test]
    fn test_double_delivery_fails() {
        let relay = ScanRelay::new();
        let request = relay.register();
        relay.deliver(request, "123456789".to_string()).unwrap();
        assert_eq!(
            relay.deliver(request, "987654321".to_string()),
            Err(RelayError::AlreadyDelivered)
        );
    }

    #[test]
    fn test_cancel_drops_pending_slot() {
        let relay = ScanRelay::new();
        let request = relay.register();
        relay.cancel(request);
        assert_eq!(relay.take(request), Err(RelayError::UnknownRequest));
    }

    #[test]
    fn test_abandoned_sessions_expire() {
        let relay = ScanRelay::new();
        let abandoned = relay.register();
        relay.deliver(abandoned, "123456789".to_string()).unwrap();

        // con TTL cero todo slot ya venció, consumido o no
        relay.sweep_older_than(Duration::ZERO);

        assert_eq!(relay.take(abandoned), Err(RelayError::UnknownRequest));
    }

    #[test]
    fn test_fresh_sessions_survive_the_sweep() {
        let relay = ScanRelay::new();
        let pending = relay.register();
        let delivered = relay.register();
        relay.deliver(delivered, "123456789".to_string()).unwrap();

        relay.sweep_older_than(Duration::from_secs(3600));

        assert_eq!(relay.take(pending).unwrap(), None);
        assert_eq!(
            relay.take(delivered).unwrap(),
            Some("123456789".to_string())
        );
    }
}
