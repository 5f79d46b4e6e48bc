//! # Errores del Servidor
//! src/error.rs
//!
//! Errores fatales de arranque: socket, TLS y configuración. Los errores por
//! conexión (accept, handshake, lectura, escritura) se quedan como
//! `std::io::Error` y se contienen dentro del manejo de esa conexión.

use std::io;

use thiserror::Error;

/// Alias de resultado para operaciones del servidor
pub type ServerResult<T> = Result<T, ServerError>;

/// Errores que abortan el arranque del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// Fallo de socket/bind/listen
    #[error("network error: {0}")]
    Io(#[from] io::Error),

    /// Fallo creando el contexto TLS o cargando certificado/llave
    #[error("TLS error: {0}")]
    Tls(String),

    /// Archivo de configuración ilegible o inválido
    #[error("config error: {0}")]
    Config(String),

    /// Archivo de rutas ilegible
    #[error("routing error: {0}")]
    Routing(String),
}
