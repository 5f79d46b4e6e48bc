//! # Contexto y Sesiones TLS
//! src/server/tls.rs
//!
//! El handshake y el procesamiento de registros se delegan a rustls; este
//! módulo solo construye el contexto del servidor (certificado + llave en PEM)
//! y conduce el ciclo de vida de una sesión sobre un socket bloqueante.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, ServerConnection};

use crate::error::{ServerError, ServerResult};

/// Rutas del certificado y la llave privada del servidor
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl TlsConfig {
    pub fn new(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Self {
        Self {
            cert_path: cert_path.as_ref().to_path_buf(),
            key_path: key_path.as_ref().to_path_buf(),
        }
    }

    /// Construye el `ServerConfig` de rustls.
    ///
    /// Cualquier fallo aquí (archivo ilegible, PEM sin certificados o sin
    /// llave) es fatal de arranque.
    pub fn build_server_config(&self) -> ServerResult<Arc<ServerConfig>> {
        let certs = load_certs(&self.cert_path)?;
        let key = load_private_key(&self.key_path)?;

        let config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| ServerError::Tls(e.to_string()))?;

        Ok(Arc::new(config))
    }
}

/// Carga la cadena de certificados desde un archivo PEM.
fn load_certs(path: &Path) -> ServerResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| {
        ServerError::Tls(format!(
            "failed to open certificate file {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .filter_map(Result::ok)
        .collect();

    if certs.is_empty() {
        return Err(ServerError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }

    Ok(certs)
}

/// Carga la llave privada desde un archivo PEM (PKCS#8, PKCS#1 o SEC1).
fn load_private_key(path: &Path) -> ServerResult<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| {
        ServerError::Tls(format!("failed to open key file {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(rustls_pemfile::Item::Pkcs1Key(key))) => {
                return Ok(PrivateKeyDer::Pkcs1(key));
            }
            Ok(Some(rustls_pemfile::Item::Pkcs8Key(key))) => {
                return Ok(PrivateKeyDer::Pkcs8(key));
            }
            Ok(Some(rustls_pemfile::Item::Sec1Key(key))) => {
                return Ok(PrivateKeyDer::Sec1(key));
            }
            Ok(Some(_)) => {
                // Otros items del PEM (certificados, etc.) se saltan
            }
            Ok(None) => break,
            Err(e) => {
                return Err(ServerError::Tls(format!(
                    "failed to parse key file {}: {}",
                    path.display(),
                    e
                )));
            }
        }
    }

    Err(ServerError::Tls(format!(
        "no private key found in {}",
        path.display()
    )))
}

/// Sesión TLS del lado servidor sobre un socket bloqueante
pub struct TlsStream<S> {
    socket: S,
    conn: ServerConnection,
}

impl<S: Read + Write> TlsStream<S> {
    /// Crea la sesión para un socket recién aceptado.
    pub fn new(socket: S, config: Arc<ServerConfig>) -> ServerResult<Self> {
        let conn = ServerConnection::new(config)
            .map_err(|e| ServerError::Tls(format!("failed to create TLS session: {e}")))?;

        Ok(Self { socket, conn })
    }

    /// Completa el handshake de forma síncrona.
    ///
    /// Un fallo aquí es un error por conexión: se loguea y se cierra, nunca
    /// afecta la vida del servidor.
    pub fn handshake(&mut self) -> io::Result<()> {
        while self.conn.is_handshaking() {
            self.conn.complete_io(&mut self.socket)?;
        }
        Ok(())
    }

    /// Cierra la sesión: encola el close_notify y lo vacía al socket.
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.conn.send_close_notify();
        self.flush()
    }
}

impl<S: Read + Write> Read for TlsStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Traer registros del socket hasta tener plaintext disponible
        while self.conn.wants_read() {
            if self.conn.read_tls(&mut self.socket)? == 0 {
                break; // EOF del socket
            }
            self.conn
                .process_new_packets()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }

        self.conn.reader().read(buf)
    }
}

impl<S: Read + Write> Write for TlsStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.conn.writer().write(buf)?;

        while self.conn.wants_write() {
            if self.conn.write_tls(&mut self.socket)? == 0 {
                break;
            }
        }

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        while self.conn.wants_write() {
            if self.conn.write_tls(&mut self.socket)? == 0 {
                break;
            }
        }
        self.socket.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_config_paths() {
        let config = TlsConfig::new("./secret/server.crt", "./secret/server.key");
        assert_eq!(config.cert_path.to_str(), Some("./secret/server.crt"));
        assert_eq!(config.key_path.to_str(), Some("./secret/server.key"));
    }

    #[test]
    fn test_missing_certificate_is_fatal() {
        let config = TlsConfig::new("./no/such/cert.pem", "./no/such/key.pem");
        let result = config.build_server_config();
        assert!(matches!(result, Err(ServerError::Tls(_))));
    }

    #[test]
    fn test_pem_without_certificates_is_fatal() {
        let empty = std::env::temp_dir().join(format!(
            "https_server_tls_{}_empty.pem",
            std::process::id()
        ));
        std::fs::write(&empty, "not a pem\n").unwrap();

        let result = load_certs(&empty);
        assert!(matches!(result, Err(ServerError::Tls(_))));

        let _ = std::fs::remove_file(empty);
    }

    #[test]
    fn test_pem_without_key_is_fatal() {
        let empty = std::env::temp_dir().join(format!(
            "https_server_tls_{}_nokey.pem",
            std::process::id()
        ));
        std::fs::write(&empty, "").unwrap();

        let result = load_private_key(&empty);
        assert!(matches!(result, Err(ServerError::Tls(_))));

        let _ = std::fs::remove_file(empty);
    }
}
