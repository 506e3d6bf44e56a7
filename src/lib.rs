//! Núcleo de rondas de patrulla
//!
//! Ciclo de vida de rondas, verificación de checkpoints, adquisición de
//! códigos, traza GPS, métricas de ruta y escalamiento de incidentes,
//! expuesto como API HTTP con Axum sobre PostgreSQL.

pub mod acquisition;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod geolocation;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
