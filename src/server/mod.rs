//! # Módulo del Servidor
//!
//! Runtime del servidor y sus piezas por conexión:
//! - `tcp`: listener, loop de accept y orquestación del arranque/apagado
//! - `tls`: contexto rustls y ciclo de vida de la sesión cifrada
//! - `handler`: lectura, parsing y respuesta de un request

pub mod handler;
pub mod tcp;
pub mod tls;

pub use tcp::Server;
