//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores del subsistema de adquisición de código (cámara)
///
/// Cada variante clasifica un error reportado por el dispositivo; todas
/// degradan el flujo a entrada manual y nunca se reintentan más allá de
/// la escalera de configuraciones de captura.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera found on device")]
    CameraNotFound,

    #[error("Camera is in use by another application")]
    CameraInUse,

    #[error("Requested capture configuration is not supported")]
    CaptureUnsupported,

    #[error("Media capture is not supported by this browser")]
    BrowserUnsupported,
}

/// Error de validación sintáctica de un token de checkpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed token: {0}")]
pub struct TokenValidationError(pub String);

/// Errores del motor de verificación de checkpoints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Checkpoint not found for this client")]
    CheckpointNotFound,

    #[error("Round is not active")]
    NotInRound,

    #[error("Checkpoint already visited in this round")]
    DuplicateVisit,
}

/// Error de transición inválida en un ciclo de vida (ronda o incidente)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid transition: {0}")]
pub struct TransitionError(pub String);

/// Error de geolocalización - nunca es fatal, siempre hay fallback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Geolocation permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    Unavailable,

    #[error("Position read timed out")]
    Timeout,
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Verification failed: {0}")]
    Verification(VerificationError),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Acquisition failed: {0}")]
    Acquisition(AcquisitionError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

impl From<TokenValidationError> for AppError {
    fn from(e: TokenValidationError) -> Self {
        AppError::MalformedToken(e.0)
    }
}

impl From<VerificationError> for AppError {
    fn from(e: VerificationError) -> Self {
        AppError::Verification(e)
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::InvalidTransition(e.0)
    }
}

impl From<AcquisitionError> for AppError {
    fn from(e: AcquisitionError) -> Self {
        AppError::Acquisition(e)
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::MalformedToken(msg) => {
                tracing::warn!("Malformed token: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Malformed Token".to_string(),
                        message: msg,
                        details: None,
                        code: Some("MALFORMED_TOKEN".to_string()),
                    },
                )
            }

            AppError::Verification(e) => {
                tracing::warn!("Verification failed: {}", e);
                let (status, code) = match e {
                    VerificationError::CheckpointNotFound => {
                        (StatusCode::NOT_FOUND, "CHECKPOINT_NOT_FOUND")
                    }
                    VerificationError::NotInRound => (StatusCode::CONFLICT, "NOT_IN_ROUND"),
                    VerificationError::DuplicateVisit => (StatusCode::CONFLICT, "DUPLICATE_VISIT"),
                };
                (
                    status,
                    ErrorResponse {
                        error: "Verification Error".to_string(),
                        message: e.to_string(),
                        details: None,
                        code: Some(code.to_string()),
                    },
                )
            }

            AppError::InvalidTransition(msg) => {
                tracing::warn!("Invalid transition: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Invalid Transition".to_string(),
                        message: msg,
                        details: None,
                        code: Some("INVALID_TRANSITION".to_string()),
                    },
                )
            }

            AppError::Acquisition(e) => {
                tracing::warn!("Acquisition failed: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: "Acquisition Error".to_string(),
                        message: e.to_string(),
                        details: Some(json!({ "fallback": "manual_entry" })),
                        code: Some("ACQUISITION_ERROR".to_string()),
                    },
                )
            }

            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Unauthorized".to_string(),
                        message: msg,
                        details: None,
                        code: Some("UNAUTHORIZED".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                tracing::warn!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFLICT".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Service Unavailable".to_string(),
                        message: msg,
                        details: None,
                        code: Some("SERVICE_UNAVAILABLE".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => {
                tracing::warn!("JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "JWT Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("JWT_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_visit_is_rejected_as_conflict() {
        // política: re-escanear un checkpoint visitado se rechaza, la
        // visita original queda intacta
        let response = AppError::from(VerificationError::DuplicateVisit).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unknown_checkpoint_is_not_found() {
        let response = AppError::from(VerificationError::CheckpointNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_acquisition_failure_degrades_to_manual_entry() {
        let response = AppError::from(AcquisitionError::PermissionDenied).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let response = AppError::from(TransitionError("finish on pending".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
