//! Repositorio de checkpoints
//!
//! Los checkpoints son propiedad de la gestión de clientes; este núcleo
//! solo los lee para resolver tokens contra el cliente de la ronda.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::checkpoint::Checkpoint;
use crate::utils::errors::AppError;

/// Lectura de checkpoints por cliente
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn find_by_client_and_code(
        &self,
        client_id: Uuid,
        code: &str,
    ) -> Result<Option<Checkpoint>, AppError>;

    async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Checkpoint>, AppError>;
}

pub struct CheckpointRepository {
    pool: PgPool,
}

impl CheckpointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for CheckpointRepository {
    /// Resolver un código contra los checkpoints del cliente
    async fn find_by_client_and_code(
        &self,
        client_id: Uuid,
        code: &str,
    ) -> Result<Option<Checkpoint>, AppError> {
        let checkpoint = sqlx::query_as::<_, Checkpoint>(
            "SELECT * FROM checkpoints WHERE client_id = $1 AND code = $2",
        )
        .bind(client_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checkpoint)
    }

    /// Checkpoints del cliente en su orden de visita previsto
    async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Checkpoint>, AppError> {
        let checkpoints = sqlx::query_as::<_, Checkpoint>(
            "SELECT * FROM checkpoints WHERE client_id = $1 ORDER BY order_index ASC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkpoints)
    }
}
