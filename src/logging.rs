//! # Logging del Servidor
//! src/logging.rs
//!
//! Inicializa el subscriber global de `tracing`: los eventos se escriben a
//! stdout y se duplican a `server.log`. Antes de abrir el archivo se aplica el
//! recorte por tamaño configurado (`log_max_size`): un log que supera el
//! límite se elimina y la siguiente apertura parte de cero.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::error::ServerResult;

/// Archivo de log del servidor, relativo al directorio de trabajo
pub const LOG_PATH: &str = "./server.log";

/// Inicializa el subscriber global. Llamar una sola vez, al arrancar.
pub fn init(log_max_size: u64) -> ServerResult<()> {
    cull_log_file(Path::new(LOG_PATH), log_max_size)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_PATH)?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(Arc::new(file)))
        .init();

    Ok(())
}

/// Elimina el archivo de log si supera `max_bytes`.
pub fn cull_log_file(path: &Path, max_bytes: u64) -> ServerResult<()> {
    if let Ok(meta) = fs::metadata(path) {
        if meta.len() > max_bytes {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_log(name: &str, content: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "https_server_log_{}_{}",
            std::process::id(),
            name
        ));
        fs::write(&path, content).expect("write temp log");
        path
    }

    #[test]
    fn test_cull_removes_oversized_log() {
        let path = temp_log("oversized", &[b'x'; 128]);

        cull_log_file(&path, 64).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_cull_keeps_log_within_limit() {
        let path = temp_log("small", b"short");

        cull_log_file(&path, 64).unwrap();
        assert!(path.exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_cull_ignores_missing_log() {
        let path = std::env::temp_dir().join("https_server_log_missing");
        assert!(cull_log_file(&path, 64).is_ok());
    }
}
