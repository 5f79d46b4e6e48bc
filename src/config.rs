//! # Configuración del Servidor
//! src/config.rs
//!
//! La configuración vive en un archivo `clave=valor`, una clave por línea.
//! Toda clave tiene un default si está ausente; una clave desconocida o un
//! valor que no parsea se reporta y se ignora, nunca aborta la carga.
//!
//! ## Ejemplo de archivo
//!
//! ```text
//! # server.conf
//! port=8443
//! thread_pool_size=8
//! rate_limit_max_requests=100
//! rate_limit_window=60
//! routing_config=./routing.conf
//! tls_cert=./secret/server.crt
//! tls_key=./secret/server.key
//! ```
//!
//! La línea de comandos solo selecciona el archivo y permite sobrescribir el
//! puerto:
//!
//! ```bash
//! ./https_server --config ./server.conf --port 8443
//! ```

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::thread;

use clap::Parser;

use crate::error::{ServerError, ServerResult};

/// Argumentos de línea de comandos
#[derive(Debug, Parser)]
#[command(name = "https_server")]
#[command(about = "Servidor HTTPS/1.0 concurrente de contenido estático")]
#[command(version)]
pub struct Cli {
    /// Ruta del archivo de configuración del servidor
    #[arg(short, long, default_value = "./server.conf", env = "HTTPS_CONFIG")]
    pub config: String,

    /// Puerto de escucha (sobrescribe el valor del archivo)
    #[arg(short, long, env = "HTTPS_PORT")]
    pub port: Option<u16>,
}

/// Configuración tipada del servidor
#[derive(Debug, Clone)]
pub struct Config {
    /// Puerto de escucha
    pub port: u16,

    /// Backlog del listen. `std::net` no lo expone, se mantiene como parte
    /// de la interfaz del archivo y se reporta en el arranque.
    pub backlog: u32,

    /// Tamaño del pool de workers; 0 = paralelismo del hardware
    pub thread_pool_size: usize,

    /// Máximo de conexiones por cliente dentro de una ventana
    pub rate_limit_max_requests: u64,

    /// Largo de la ventana de rate limiting, en segundos
    pub rate_limit_window: u64,

    /// Tamaño máximo del archivo de log, en bytes
    pub log_max_size: u64,

    /// Antigüedad a partir de la cual se purgan ventanas de clientes, en segundos
    pub cull_threshold: u64,

    /// Plazo de lectura/escritura por socket, en segundos
    pub io_timeout: u64,

    /// Ruta del archivo de rutas
    pub routing_config: String,

    /// Ruta del certificado TLS (PEM)
    pub tls_cert: String,

    /// Ruta de la llave privada TLS (PEM)
    pub tls_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 443,
            backlog: 10,
            thread_pool_size: 0,
            rate_limit_max_requests: 100,
            rate_limit_window: 60,
            log_max_size: 1024 * 1024,
            cull_threshold: 600,
            io_timeout: 5,
            routing_config: "./routing.conf".to_string(),
            tls_cert: "./secret/server.crt".to_string(),
            tls_key: "./secret/server.key".to_string(),
        }
    }
}

impl Config {
    /// Carga la configuración desde un archivo `clave=valor`.
    ///
    /// No poder leer el archivo es un error fatal de arranque.
    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::from_lines(&text))
    }

    /// Parsea el contenido del archivo de configuración sobre los defaults.
    pub fn from_lines(text: &str) -> Self {
        let mut config = Config::default();

        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                tracing::warn!(line = line_no + 1, "config line without '=', skipping");
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "port" => config.port = parse_integer(key, value, config.port),
                "backlog" => config.backlog = parse_integer(key, value, config.backlog),
                "thread_pool_size" => {
                    config.thread_pool_size = parse_integer(key, value, config.thread_pool_size)
                }
                "rate_limit_max_requests" => {
                    config.rate_limit_max_requests =
                        parse_integer(key, value, config.rate_limit_max_requests)
                }
                "rate_limit_window" => {
                    config.rate_limit_window = parse_integer(key, value, config.rate_limit_window)
                }
                "log_max_size" => {
                    config.log_max_size = parse_integer(key, value, config.log_max_size)
                }
                "cull_threshold" => {
                    config.cull_threshold = parse_integer(key, value, config.cull_threshold)
                }
                "io_timeout" => config.io_timeout = parse_integer(key, value, config.io_timeout),
                "routing_config" => config.routing_config = value.to_string(),
                "tls_cert" => config.tls_cert = value.to_string(),
                "tls_key" => config.tls_key = value.to_string(),
                _ => tracing::warn!(key, "unknown config key, ignoring"),
            }
        }

        config
    }

    /// Obtiene la dirección completa para bind
    pub fn address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Tamaño efectivo del pool: el valor configurado o el paralelismo
    /// disponible del hardware.
    pub fn worker_count(&self) -> usize {
        if self.thread_pool_size > 0 {
            self.thread_pool_size
        } else {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4)
        }
    }

    /// Valida la configuración. Retorna errores si hay valores inválidos.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_limit_max_requests == 0 {
            return Err("rate_limit_max_requests must be >= 1".to_string());
        }
        if self.rate_limit_window == 0 {
            return Err("rate_limit_window must be >= 1".to_string());
        }
        if self.cull_threshold == 0 {
            return Err("cull_threshold must be >= 1".to_string());
        }
        if self.io_timeout == 0 {
            return Err("io_timeout must be >= 1".to_string());
        }

        Ok(())
    }
}

/// Parsea un valor entero; si no parsea se reporta y se mantiene el default.
fn parse_integer<T: FromStr + Copy>(key: &str, value: &str, fallback: T) -> T {
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, value, "expected an integer value, keeping default");
            fallback
        }
    }
}
