//! Adquisición de cámara
//!
//! Escalera descendente de configuraciones de captura: se intenta cada
//! perfil en orden con una pausa corta entre intentos; el primer éxito
//! gana y los perfiles restantes se saltan. El stream resultante es un
//! handle con liberación garantizada del recurso en Drop, de modo que
//! una adquisición posterior no falle por un recurso retenido.

use std::time::Duration;

use async_trait::async_trait;

use crate::utils::errors::AcquisitionError;

/// Pausa entre intentos de la escalera de configuraciones
const LADDER_PAUSE: Duration = Duration::from_millis(300);

/// Perfil de captura, en orden descendente de exigencia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureProfile {
    /// Cámara trasera a alta resolución (1920x1080)
    HighResRear,
    /// Cámara trasera a resolución reducida (1280x720)
    LowResRear,
    /// Cámara trasera sin restricciones de resolución
    RearUnconstrained,
    /// Cualquier cámara disponible
    AnyCamera,
}

impl CaptureProfile {
    /// Escalera completa, del perfil más exigente al menos exigente
    pub fn ladder() -> [CaptureProfile; 4] {
        [
            CaptureProfile::HighResRear,
            CaptureProfile::LowResRear,
            CaptureProfile::RearUnconstrained,
            CaptureProfile::AnyCamera,
        ]
    }
}

/// Error crudo reportado por el dispositivo de captura
///
/// El campo `name` sigue la nomenclatura de DOMException del navegador
/// (`NotAllowedError`, `NotFoundError`, `NotReadableError`, ...).
#[derive(Debug, Clone)]
pub struct DeviceError {
    pub name: String,
    pub message: String,
}

impl DeviceError {
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    /// Clasificar el error del dispositivo en la taxonomía cerrada
    pub fn classify(&self) -> AcquisitionError {
        match self.name.as_str() {
            "NotAllowedError" | "PermissionDeniedError" => AcquisitionError::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => AcquisitionError::CameraNotFound,
            "NotReadableError" | "TrackStartError" => AcquisitionError::CameraInUse,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                AcquisitionError::CaptureUnsupported
            }
            _ => AcquisitionError::BrowserUnsupported,
        }
    }
}

/// Stream de cámara activo
///
/// El implementador libera el recurso del dispositivo en su Drop; la
/// propiedad del handle garantiza liberación en todo camino de salida
/// (éxito, error, cancelación, navegación).
pub trait CameraStream: Send {
    /// Verificar si el stream expone control de linterna (torch)
    fn has_torch(&self) -> bool;

    /// Aplicar el cambio de constraint de linterna sin readquirir el stream
    fn set_torch(&mut self, enabled: bool) -> Result<(), AcquisitionError>;
}

/// Dispositivo de captura de medios
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Intentar abrir un stream con el perfil dado
    async fn open(&self, profile: CaptureProfile) -> Result<Box<dyn CameraStream>, DeviceError>;
}

/// Stream adquirido con su capacidad de linterna ya sondeada
pub struct ActiveStream {
    stream: Box<dyn CameraStream>,
    torch_available: bool,
    torch_on: bool,
}

impl ActiveStream {
    pub fn torch_available(&self) -> bool {
        self.torch_available
    }

    pub fn torch_on(&self) -> bool {
        self.torch_on
    }

    /// Alternar la linterna aplicando un cambio de constraint
    pub fn toggle_torch(&mut self) -> Result<bool, AcquisitionError> {
        if !self.torch_available {
            return Err(AcquisitionError::CaptureUnsupported);
        }
        let next = !self.torch_on;
        self.stream.set_torch(next)?;
        self.torch_on = next;
        Ok(next)
    }
}

/// Adquirir un stream recorriendo la escalera de perfiles
///
/// El primer perfil que abre con éxito gana y los restantes se saltan.
/// Si toda la escalera falla se devuelve la clasificación del último
/// error; nunca se reintenta más allá de la escalera.
pub async fn acquire(device: &dyn CameraDevice) -> Result<ActiveStream, AcquisitionError> {
    acquire_with_pause(device, LADDER_PAUSE).await
}

/// Variante con pausa configurable entre intentos
pub async fn acquire_with_pause(
    device: &dyn CameraDevice,
    pause: Duration,
) -> Result<ActiveStream, AcquisitionError> {
    let ladder = CaptureProfile::ladder();
    let mut last_error = AcquisitionError::BrowserUnsupported;

    for (attempt, profile) in ladder.iter().enumerate() {
        if attempt > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        match device.open(*profile).await {
            Ok(stream) => {
                let torch_available = stream.has_torch();
                tracing::info!(
                    "Camera stream acquired with profile {:?} (torch: {})",
                    profile,
                    torch_available
                );
                return Ok(ActiveStream {
                    stream,
                    torch_available,
                    torch_on: false,
                });
            }
            Err(device_error) => {
                last_error = device_error.classify();
                tracing::warn!(
                    "Capture profile {:?} failed: {} ({})",
                    profile,
                    device_error.name,
                    last_error
                );
            }
        }
    }

    tracing::warn!("Camera acquisition exhausted, degrading to manual entry");
    Err(last_error)
}
