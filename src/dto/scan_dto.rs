//! DTOs del flujo de escaneo

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Response al registrar una solicitud de escaneo
#[derive(Debug, Serialize)]
pub struct ScanSessionResponse {
    pub request_id: Uuid,
}

/// Request para entregar un token escaneado a una solicitud
#[derive(Debug, Deserialize, Validate)]
pub struct DeliverScanRequest {
    pub request_id: Uuid,

    #[validate(length(min = 1, max = 512))]
    pub token: String,
}

/// Request de entrada manual tras fallo de cámara
#[derive(Debug, Deserialize, Validate)]
pub struct ManualEntryRequest {
    pub request_id: Uuid,

    #[validate(length(min = 1, max = 64))]
    pub input: String,
}

/// Response al consultar el resultado de una solicitud
#[derive(Debug, Serialize)]
pub struct ScanResultResponse {
    pub request_id: Uuid,
    /// `None` mientras el resultado no llega
    pub token: Option<String>,
}
