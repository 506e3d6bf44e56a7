//! Validación y normalización de tokens de checkpoint
//!
//! Un token crudo es sintácticamente válido si es exactamente 9 dígitos
//! ASCII, o si parsea como payload JSON con discriminador
//! `"type": "checkpoint"` (el campo `manualCode` es opcional pero debe
//! estar bien formado si aparece). Cualquier otra forma se rechaza antes
//! de llegar al motor de verificación.

use serde::Deserialize;

use crate::utils::errors::TokenValidationError;

/// Largo exacto del código numérico de checkpoint
const CODE_LEN: usize = 9;

/// Token aceptado, listo para entregarse al motor de verificación
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointToken {
    /// Código numérico de 9 dígitos
    Numeric(String),
    /// Payload estructurado `{"type": "checkpoint", ...}`
    Structured { manual_code: Option<String> },
}

impl CheckpointToken {
    /// Código numérico embebido, si el token lo trae
    pub fn code(&self) -> Option<&str> {
        match self {
            CheckpointToken::Numeric(code) => Some(code),
            CheckpointToken::Structured { manual_code } => manual_code.as_deref(),
        }
    }
}

/// Payload estructurado de un código escaneado
#[derive(Debug, Deserialize)]
struct StructuredPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "manualCode")]
    manual_code: Option<String>,
}

fn is_nine_digits(value: &str) -> bool {
    value.len() == CODE_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// Normalizar entrada manual: quitar no-dígitos y truncar a 9 caracteres
///
/// Se acepta solo si el resultado es exactamente 9 dígitos.
pub fn normalize_manual_input(raw: &str) -> Result<String, TokenValidationError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(CODE_LEN).collect();

    if digits.len() == CODE_LEN {
        Ok(digits)
    } else {
        Err(TokenValidationError(format!(
            "manual entry must contain at least {} digits, got {}",
            CODE_LEN,
            digits.len()
        )))
    }
}

/// Validar sintácticamente un token crudo
pub fn validate_token(raw: &str) -> Result<CheckpointToken, TokenValidationError> {
    let trimmed = raw.trim();

    if is_nine_digits(trimmed) {
        return Ok(CheckpointToken::Numeric(trimmed.to_string()));
    }

    if let Ok(payload) = serde_json::from_str::<StructuredPayload>(trimmed) {
        if payload.kind != "checkpoint" {
            return Err(TokenValidationError(format!(
                "unknown token type '{}'",
                payload.kind
            )));
        }

        if let Some(code) = &payload.manual_code {
            if !is_nine_digits(code) {
                return Err(TokenValidationError(
                    "embedded manualCode is not a 9-digit code".to_string(),
                ));
            }
        }

        return Ok(CheckpointToken::Structured {
            manual_code: payload.manual_code,
        });
    }

    Err(TokenValidationError(
        "token is neither a 9-digit code nor a checkpoint payload".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_digit_token_is_valid() {
        assert_eq!(
            validate_token("123456789"),
            Ok(CheckpointToken::Numeric("123456789".to_string()))
        );
    }

    #[test]
    fn test_short_and_alpha_tokens_are_invalid() {
        assert!(validate_token("12345678").is_err());
        assert!(validate_token("abcdefghi").is_err());
        assert!(validate_token("").is_err());
    }

    #[test]
    fn test_structured_checkpoint_token_is_valid() {
        assert_eq!(
            validate_token(r#"{"type":"checkpoint"}"#),
            Ok(CheckpointToken::Structured { manual_code: None })
        );
    }

    #[test]
    fn test_structured_token_with_other_type_is_invalid() {
        assert!(validate_token(r#"{"type":"other"}"#).is_err());
    }

    #[test]
    fn test_structured_token_with_embedded_code() {
        let token = validate_token(r#"{"type":"checkpoint","manualCode":"987654321"}"#).unwrap();
        assert_eq!(token.code(), Some("987654321"));
    }

    #[test]
    fn test_structured_token_with_malformed_embedded_code_is_invalid() {
        assert!(validate_token(r#"{"type":"checkpoint","manualCode":"12345678"}"#).is_err());
        assert!(validate_token(r#"{"type":"checkpoint","manualCode":"abcdefghi"}"#).is_err());
    }

    #[test]
    fn test_manual_input_strips_non_digits() {
        assert_eq!(
            normalize_manual_input("12-345/678 9"),
            Ok("123456789".to_string())
        );
    }

    #[test]
    fn test_manual_input_truncates_to_nine() {
        assert_eq!(
            normalize_manual_input("1234567890123"),
            Ok("123456789".to_string())
        );
    }

    #[test]
    fn test_manual_input_rejects_short_entries() {
        assert!(normalize_manual_input("12345678").is_err());
        assert!(normalize_manual_input("abc").is_err());
    }
}
