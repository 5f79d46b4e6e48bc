//! # Módulo de Seguridad
//!
//! Control de admisión previo al handshake TLS: los clientes que exceden su
//! cuota se descartan antes de pagar el costo de la negociación.

pub mod rate_limit;

pub use rate_limit::{spawn_housekeeping, Admission, RateLimiter};
