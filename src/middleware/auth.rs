//! Middleware de autenticación JWT
//!
//! Extrae y valida el token Bearer e inyecta el usuario autenticado en
//! la request. Este núcleo solo necesita el rol: las operaciones
//! destructivas exigen administrador; la mecánica de cuentas vive fuera.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub name: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Chequeo de rol para operaciones destructivas
    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "This operation requires the administrator role".to_string(),
            ))
        }
    }
}

fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    match raw {
        "admin" => Ok(UserRole::Admin),
        "operator" | "tactic" => Ok(UserRole::Operator),
        other => Err(AppError::Unauthorized(format!(
            "Unknown role '{}' in token",
            other
        ))),
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    // Decodificar y validar JWT
    let token_data = decode::<Claims>(
        auth_header,
        &DecodingKey::from_secret(state.config.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    let claims = token_data.claims;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".to_string()))?;

    let user = AuthenticatedUser {
        user_id,
        name: claims.name,
        role: parse_role(&claims.role)?,
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
