//! Middleware HTTP
//!
//! Autenticación JWT con extracción de rol y configuración de CORS.

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, AuthenticatedUser};
