//! Routers de la API
//!
//! `create_app` arma el árbol completo: health público, rutas de
//! negocio detrás del middleware JWT y la capa de CORS según el
//! entorno.

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::middleware::auth::auth_middleware;
use crate::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use crate::state::AppState;

pub mod incident_routes;
pub mod round_routes;
pub mod scan_routes;

/// Construir el router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    // Rutas protegidas por JWT; los DELETE exigen además rol admin
    let api = Router::new()
        .nest("/api/round", round_routes::create_round_router())
        .nest(
            "/api/incident",
            incident_routes::create_incident_router(),
        )
        .nest("/api/scan", scan_routes::create_scan_router())
        .route("/api/device-config", get(device_config))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // En producción el CORS se restringe a los orígenes configurados
    let cors = if state.config.is_production() {
        cors_middleware_with_origins(state.config.cors_origins.clone())
    } else {
        cors_middleware()
    };

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(cors)
        .with_state(state)
}

/// Parámetros de muestreo que el dispositivo consulta al iniciar sesión
async fn device_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "trace_interval_secs": state.config.trace_interval().as_secs(),
        "position_timeout_secs": state.config.position_timeout().as_secs(),
    }))
}

/// Health check simple
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "service": "patrol-rounds",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
