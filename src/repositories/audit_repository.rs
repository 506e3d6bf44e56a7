//! Registro de auditoría de operaciones destructivas
//!
//! Cada borrado irreversible escribe aquí quién lo ejecutó y sobre qué
//! registro, dentro de la misma transacción que la cascada.

use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Insertar un registro de auditoría dentro de una transacción abierta
pub async fn record_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    action: &str,
    target_id: Uuid,
    admin_id: Uuid,
    admin_name: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, action, target_id, admin_id, admin_name, performed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(action)
    .bind(target_id)
    .bind(admin_id)
    .bind(admin_name)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
