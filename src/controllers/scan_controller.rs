//! Controller del flujo de escaneo
//!
//! Gestiona el relay correlacionado por solicitud: el flujo que necesita
//! un código abre una sesión, la vista de adquisición entrega el token
//! (escaneado o digitado) y el solicitante lo consume exactamente una
//! vez. El token se valida sintácticamente antes de entrar al relay.

use uuid::Uuid;
use validator::Validate;

use crate::acquisition::relay::ScanRelay;
use crate::acquisition::token::{normalize_manual_input, validate_token};
use crate::dto::scan_dto::{
    DeliverScanRequest, ManualEntryRequest, ScanResultResponse, ScanSessionResponse,
};
use crate::dto::ApiResponse;
use crate::utils::errors::AppError;

pub struct ScanController {
    relay: ScanRelay,
}

impl ScanController {
    pub fn new(relay: ScanRelay) -> Self {
        Self { relay }
    }

    /// Abrir una sesión de escaneo y devolver su request_id
    pub fn open_session(&self) -> ApiResponse<ScanSessionResponse> {
        ApiResponse::success(ScanSessionResponse {
            request_id: self.relay.register(),
        })
    }

    /// Entregar un token escaneado por cámara
    pub fn deliver(
        &self,
        request: DeliverScanRequest,
    ) -> Result<ApiResponse<ScanResultResponse>, AppError> {
        request.validate()?;

        // el token malformado se rechaza antes de entrar al relay
        validate_token(&request.token)?;
        self.relay.deliver(request.request_id, request.token.clone())?;

        Ok(ApiResponse::success_with_message(
            ScanResultResponse {
                request_id: request.request_id,
                token: Some(request.token),
            },
            "Scan delivered".to_string(),
        ))
    }

    /// Entregar un código digitado a mano tras fallo de cámara
    pub fn deliver_manual(
        &self,
        request: ManualEntryRequest,
    ) -> Result<ApiResponse<ScanResultResponse>, AppError> {
        request.validate()?;

        let token = normalize_manual_input(&request.input)?;
        self.relay.deliver(request.request_id, token.clone())?;

        Ok(ApiResponse::success_with_message(
            ScanResultResponse {
                request_id: request.request_id,
                token: Some(token),
            },
            "Manual entry accepted".to_string(),
        ))
    }

    /// Consumir el resultado de la sesión (una sola vez)
    pub fn poll(&self, request_id: Uuid) -> Result<ScanResultResponse, AppError> {
        let token = self.relay.take(request_id)?;
        Ok(ScanResultResponse { request_id, token })
    }

    /// Descartar una sesión cuyo flujo dueño terminó
    pub fn cancel(&self, request_id: Uuid) -> ApiResponse<()> {
        self.relay.cancel(request_id);
        ApiResponse::success_with_message((), "Scan session discarded".to_string())
    }
}
