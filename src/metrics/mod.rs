//! # Módulo de Métricas
//!
//! Contadores del servidor y el documento JSON del endpoint `/status`.

pub mod collector;

pub use collector::{format_uptime, ServerStats};
