//! Motor de verificación de checkpoints
//!
//! `verify(round, token) -> Visit | VerificationError`. Resuelve el
//! token contra los checkpoints del cliente de la ronda, exige ronda
//! activa y escribe la visita con la posición del dispositivo o, en su
//! defecto, las coordenadas registradas del checkpoint.
//!
//! Política de duplicados: re-escanear un checkpoint ya visitado en la
//! misma ronda se RECHAZA; la visita original queda intacta. El
//! pre-chequeo de existencia responde rápido; la restricción única del
//! esquema cubre la carrera entre dos envíos simultáneos.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use crate::acquisition::token::validate_token;
use crate::models::round::Round;
use crate::models::visit::{CheckpointVisit, VisitStatus};
use crate::repositories::{CheckpointRepository, CheckpointStore, VisitRepository, VisitStore};
use crate::utils::errors::{AppError, VerificationError};
use crate::utils::geo::LatLng;

pub struct VerificationService {
    checkpoints: Arc<dyn CheckpointStore>,
    visits: Arc<dyn VisitStore>,
}

impl VerificationService {
    pub fn new(pool: PgPool) -> Self {
        Self::with_stores(
            Arc::new(CheckpointRepository::new(pool.clone())),
            Arc::new(VisitRepository::new(pool)),
        )
    }

    pub fn with_stores(
        checkpoints: Arc<dyn CheckpointStore>,
        visits: Arc<dyn VisitStore>,
    ) -> Self {
        Self { checkpoints, visits }
    }

    /// Verificar un token contra la ronda y registrar la visita
    ///
    /// `device_position` es la posición capturada por el dispositivo al
    /// momento del escaneo, si la entrega dentro de su espera acotada.
    /// No se valida ninguna secuencia: `order_index` es consultivo.
    pub async fn verify(
        &self,
        round: &Round,
        raw_token: &str,
        device_position: Option<LatLng>,
        source: VisitStatus,
    ) -> Result<CheckpointVisit, AppError> {
        // el token malformado se rechaza antes de tocar persistencia
        let token = validate_token(raw_token)?;

        let code = token
            .code()
            .ok_or(VerificationError::CheckpointNotFound)?
            .to_string();

        let checkpoint = self
            .checkpoints
            .find_by_client_and_code(round.client_id, &code)
            .await?
            .ok_or(VerificationError::CheckpointNotFound)?;

        if !round.is_active() {
            return Err(VerificationError::NotInRound.into());
        }

        if self.visits.exists(round.id, checkpoint.id).await? {
            return Err(VerificationError::DuplicateVisit.into());
        }

        let position =
            device_position.unwrap_or_else(|| LatLng::new(checkpoint.lat, checkpoint.lng));

        let visit = self
            .visits
            .create(
                round.id,
                checkpoint.id,
                Utc::now(),
                position.lat,
                position.lng,
                source,
            )
            .await?;

        tracing::info!(
            "Checkpoint {} verified for round {} ({:?})",
            checkpoint.id,
            round.id,
            source
        );

        Ok(visit)
    }
}
