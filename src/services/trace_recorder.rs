//! Grabador de traza de ubicación
//!
//! Tarea de fondo cancelable que muestrea la posición del dispositivo en
//! un intervalo fijo (default 3 segundos) y entrega cada muestra a un
//! sink. El sink productivo persiste el punto para la ronda activa (si
//! la hay) y lo publica en una suscripción en vivo para los monitores.
//! El grabador corre desacoplado del ciclo de vida de la ronda: arranca
//! al abrir la aplicación y se detiene al desmontar la vista dueña,
//! liberando el timer y la suscripción de ubicación subyacente.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::geolocation::{locate_within, Geolocator};
use crate::repositories::RoutePointStore;
use crate::utils::errors::AppError;
use crate::utils::geo::LatLng;

/// Intervalo de muestreo por defecto
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(3);

/// Una muestra de posición lista para persistir y publicar
#[derive(Debug, Clone)]
pub struct TraceSample {
    /// Ronda activa del dispositivo al momento de la muestra, si alguna
    pub round_id: Option<Uuid>,
    pub position: LatLng,
    pub recorded_at: DateTime<Utc>,
}

/// Destino de las muestras del grabador
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn record(&self, sample: TraceSample) -> Result<(), AppError>;
}

/// Sink productivo: persistencia append-only más feed en vivo
///
/// Las muestras sin ronda activa solo se publican en vivo; las demás se
/// escriben en route_points (los duplicados exactos se descartan en el
/// repositorio) y luego se publican.
pub struct PersistingTraceSink {
    route_points: Arc<dyn RoutePointStore>,
    live: broadcast::Sender<TraceSample>,
}

impl PersistingTraceSink {
    pub fn new(route_points: Arc<dyn RoutePointStore>, live: broadcast::Sender<TraceSample>) -> Self {
        Self { route_points, live }
    }
}

#[async_trait]
impl TraceSink for PersistingTraceSink {
    async fn record(&self, sample: TraceSample) -> Result<(), AppError> {
        if let Some(round_id) = sample.round_id {
            self.route_points
                .append(
                    round_id,
                    sample.position.lat,
                    sample.position.lng,
                    sample.recorded_at,
                )
                .await?;
        }

        // sin receptores no es un error: los monitores son opcionales
        let _ = self.live.send(sample);
        Ok(())
    }
}

/// Handle del grabador en ejecución
///
/// `stop` cancela el loop y espera su salida; soltar el handle también
/// cancela, de modo que el timer y el recurso de ubicación no quedan
/// corriendo sin dueño.
pub struct TraceRecorderHandle {
    active_round: Arc<Mutex<Option<Uuid>>>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TraceRecorderHandle {
    /// Definir la ronda a la que se atribuyen las próximas muestras
    pub fn set_active_round(&self, round_id: Option<Uuid>) {
        *self
            .active_round
            .lock()
            .expect("trace recorder lock poisoned") = round_id;
    }

    pub fn active_round(&self) -> Option<Uuid> {
        *self
            .active_round
            .lock()
            .expect("trace recorder lock poisoned")
    }

    /// Detener el grabador y esperar a que el loop termine
    pub async fn stop(mut self) {
        let _ = self.cancel.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TraceRecorderHandle {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// Grabador de traza
pub struct TraceRecorder;

impl TraceRecorder {
    /// Arrancar el loop de muestreo
    ///
    /// El loop corre hasta que el handle lo cancele. Una lectura fallida
    /// de posición se registra y se salta; no detiene el muestreo.
    pub fn start(
        geolocator: Arc<dyn Geolocator>,
        sink: Arc<dyn TraceSink>,
        sample_interval: Duration,
        position_timeout: Duration,
    ) -> TraceRecorderHandle {
        let active_round = Arc::new(Mutex::new(None));
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let round_for_task = active_round.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sample_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // el primer tick es inmediato; el muestreo empieza al abrir
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => {
                        tracing::info!("Trace recorder stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match locate_within(geolocator.as_ref(), position_timeout).await {
                            Ok(position) => {
                                let sample = TraceSample {
                                    round_id: *round_for_task
                                        .lock()
                                        .expect("trace recorder lock poisoned"),
                                    position,
                                    recorded_at: Utc::now(),
                                };
                                if let Err(e) = sink.record(sample).await {
                                    tracing::error!("Failed to record trace sample: {}", e);
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Position sample skipped: {}", e);
                            }
                        }
                    }
                }
            }
        });

        TraceRecorderHandle {
            active_round,
            cancel: cancel_tx,
            task: Some(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::testing::FixedGeolocator;
    use crate::repositories::testing::InMemoryRoutePoints;

    /// Sink que acumula muestras en memoria
    #[derive(Default)]
    struct CollectingSink {
        samples: Mutex<Vec<TraceSample>>,
    }

    impl CollectingSink {
        fn count(&self) -> usize {
            self.samples.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TraceSink for CollectingSink {
        async fn record(&self, sample: TraceSample) -> Result<(), AppError> {
            self.samples.lock().unwrap().push(sample);
            Ok(())
        }
    }

    fn recorder_under_test(
        sink: Arc<CollectingSink>,
    ) -> (TraceRecorderHandle, Arc<FixedGeolocator>) {
        let geolocator = Arc::new(FixedGeolocator::at(-23.55, -46.63));
        let handle = TraceRecorder::start(
            geolocator.clone(),
            sink,
            Duration::from_secs(3),
            Duration::from_secs(1),
        );
        (handle, geolocator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_on_interval() {
        let sink = Arc::new(CollectingSink::default());
        let (handle, _geo) = recorder_under_test(sink.clone());

        tokio::time::sleep(Duration::from_millis(9500)).await;
        assert_eq!(sink.count(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_sampling() {
        let sink = Arc::new(CollectingSink::default());
        let (handle, _geo) = recorder_under_test(sink.clone());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let before = sink.count();
        assert!(before >= 1);

        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sink.count(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_without_round_are_untagged() {
        let sink = Arc::new(CollectingSink::default());
        let (handle, _geo) = recorder_under_test(sink.clone());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.stop().await;

        let samples = sink.samples.lock().unwrap();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.round_id.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_round_is_attached_to_samples() {
        let sink = Arc::new(CollectingSink::default());
        let (handle, _geo) = recorder_under_test(sink.clone());
        let round_id = Uuid::new_v4();

        handle.set_active_round(Some(round_id));
        tokio::time::sleep(Duration::from_millis(3500)).await;

        handle.set_active_round(None);
        handle.stop().await;

        let samples = sink.samples.lock().unwrap();
        assert!(samples.iter().any(|s| s.round_id == Some(round_id)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_position_read_is_skipped() {
        let sink = Arc::new(CollectingSink::default());
        let geolocator = Arc::new(FixedGeolocator::denied());
        let handle = TraceRecorder::start(
            geolocator,
            sink.clone(),
            Duration::from_secs(3),
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.stop().await;

        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_persisting_sink_discards_exact_resend() {
        let store = Arc::new(InMemoryRoutePoints::default());
        let (live, _keep_alive) = broadcast::channel(8);
        let sink = PersistingTraceSink::new(store.clone(), live);

        let sample = TraceSample {
            round_id: Some(Uuid::new_v4()),
            position: LatLng::new(-23.55, -46.63),
            recorded_at: Utc::now(),
        };

        // un reintento de red reenvía la misma muestra exacta
        sink.record(sample.clone()).await.unwrap();
        sink.record(sample).await.unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_persisting_sink_keeps_distinct_samples() {
        let store = Arc::new(InMemoryRoutePoints::default());
        let (live, _keep_alive) = broadcast::channel(8);
        let sink = PersistingTraceSink::new(store.clone(), live);
        let round_id = Some(Uuid::new_v4());

        let first = TraceSample {
            round_id,
            position: LatLng::new(-23.55, -46.63),
            recorded_at: Utc::now(),
        };
        let mut second = first.clone();
        second.recorded_at = first.recorded_at + chrono::Duration::seconds(3);

        sink.record(first).await.unwrap();
        sink.record(second).await.unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_persisting_sink_only_broadcasts_untagged_samples() {
        let store = Arc::new(InMemoryRoutePoints::default());
        let (live, mut monitor) = broadcast::channel(8);
        let sink = PersistingTraceSink::new(store.clone(), live);

        sink.record(TraceSample {
            round_id: None,
            position: LatLng::new(-23.55, -46.63),
            recorded_at: Utc::now(),
        })
        .await
        .unwrap();

        assert!(store.is_empty());
        assert!(monitor.try_recv().is_ok());
    }
}
