use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use patrol_rounds::config::environment::EnvironmentConfig;
use patrol_rounds::database;
use patrol_rounds::routes::create_app;
use patrol_rounds::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🛡️ Patrol Rounds - núcleo de rondas, checkpoints e incidentes");
    info!("=============================================================");

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let app_state = AppState::new(pool, EnvironmentConfig::default());

    // Monitor del feed en vivo de traza, solo a nivel debug
    let mut trace_feed = app_state.subscribe_trace();
    tokio::spawn(async move {
        while let Ok(sample) = trace_feed.recv().await {
            tracing::debug!(
                "📍 Muestra de traza: ronda {:?} en ({}, {})",
                sample.round_id,
                sample.position.lat,
                sample.position.lng
            );
        }
    });

    let app = create_app(app_state.clone());

    // Puerto del servidor
    let port = app_state.config.port;
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔧 Entorno: {} ({})", app_state.config.environment, app_state.config.server_url());
    if app_state.config.is_development() {
        info!("🔓 Modo desarrollo: CORS permisivo");
    }
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚓 Endpoints - Round:");
    info!("   POST /api/round - Crear ronda");
    info!("   POST /api/round/:id/start - Iniciar ronda");
    info!("   POST /api/round/:id/visit - Verificar checkpoint");
    info!("   POST /api/round/:id/finish - Finalizar ronda");
    info!("   POST /api/round/:id/trace - Ingesta de muestra GPS");
    info!("   GET  /api/round/active/:operator_id - Ronda activa del operador");
    info!("   GET  /api/round/:id/metrics - Métricas de la ronda");
    info!("   DELETE /api/round/:id - Borrado auditado (admin)");
    info!("🚨 Endpoints - Incident:");
    info!("   POST /api/incident - Reportar incidente");
    info!("   POST /api/incident/emergency - Fast-path de emergencia");
    info!("   POST /api/incident/:id/investigate - Investigar");
    info!("   POST /api/incident/:id/resolve - Resolver");
    info!("   POST /api/incident/:id/reopen - Reabrir");
    info!("   DELETE /api/incident/:id - Borrado auditado (admin)");
    info!("📷 Endpoints - Scan:");
    info!("   POST /api/scan/session - Abrir sesión de escaneo");
    info!("   POST /api/scan/deliver - Entregar token escaneado");
    info!("   POST /api/scan/manual - Entrada manual");
    info!("   GET  /api/scan/session/:id - Consumir resultado");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
