//! Utilidades compartidas
//!
//! Manejo de errores y cálculo geográfico.

pub mod errors;
pub mod geo;
