//! # HTTPS Server
//! src/lib.rs
//!
//! Servidor HTTPS/1.0 concurrente de contenido estático: un pool fijo de
//! workers atiende un job por conexión aceptada, un rate limiter de ventana
//! fija descarta clientes abusivos antes del handshake TLS y una tabla de
//! rutas inmutable sirve contenido precargado en memoria.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: parsing de la request line y construcción de responses HTTP/1.0
//! - `server`: listener, sesión TLS y atención de conexiones
//! - `router`: tabla inmutable path → contenido precargado
//! - `security`: admisión por rate limiting previa al handshake
//! - `workers`: pool fijo de threads sobre una cola FIFO compartida
//! - `metrics`: contadores atómicos y el endpoint `/status`
//! - `config`: archivo `clave=valor` con defaults
//! - `logging`: tracing a stdout + archivo con recorte por tamaño
//!
//! ## Ejemplo de uso
//!
//! ```ignore
//! use https_server::config::Config;
//! use https_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::new(config)?;
//! server.run()?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod security;
pub mod server;
pub mod workers;
