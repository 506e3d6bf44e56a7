//! Modelo de User
//!
//! Solo el rol importa para este núcleo: las operaciones destructivas
//! (borrado auditado de rondas e incidentes) están restringidas a
//! administradores. El CRUD de cuentas vive en colaboradores externos.

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    /// Operador móvil que ejecuta la ronda ("táctico")
    Operator,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}
