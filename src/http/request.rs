//! # Parsing de la Request Line HTTP/1.0
//! src/http/request.rs
//!
//! El servidor solo necesita método y path, así que el parser se limita a la
//! primera línea del request. La línea se tokeniza con un límite duro de
//! longitud y debe tener exactamente tres tokens:
//!
//! ```text
//! GET /index HTTP/1.0\r\n
//! ```
//!
//! Lo que siga después de la primera línea (headers, body) se ignora.

use thiserror::Error;

/// Longitud máxima aceptada para la request line, en bytes
pub const MAX_REQUEST_LINE: usize = 4096;

/// Métodos HTTP reconocidos por el parser
///
/// El servidor solo atiende GET; HEAD y POST se parsean para poder responder
/// 405 en vez de 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
}

impl Method {
    fn from_token(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ if s.chars().all(|c| c.is_ascii_alphabetic()) => {
                Err(ParseError::UnsupportedMethod(s.to_string()))
            }
            _ => Err(ParseError::InvalidRequestLine),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío o solo espacios en blanco
    #[error("empty request")]
    EmptyRequest,

    /// La request line no tiene la forma `METHOD PATH VERSION`
    #[error("invalid request line format")]
    InvalidRequestLine,

    /// La request line supera [`MAX_REQUEST_LINE`]
    #[error("request line too long")]
    LineTooLong,

    /// Token de método bien formado pero no reconocido
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Representa la request line parseada
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
}

impl Request {
    /// Parsea la primera línea de un request HTTP/1.0.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use https_server::http::{Method, Request};
    ///
    /// let raw = b"GET /index HTTP/1.0\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.path(), "/index");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Solo interesa la primera línea; el resto del buffer puede incluso
        // no ser UTF-8 válido.
        let line_end = buffer
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(buffer.len());

        if line_end > MAX_REQUEST_LINE {
            return Err(ParseError::LineTooLong);
        }

        let line = std::str::from_utf8(&buffer[..line_end])
            .map_err(|_| ParseError::InvalidRequestLine)?
            .trim();

        if line.is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // Exactamente tres tokens: METHOD PATH VERSION
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_token(parts[0])?;
        let path = parts[1].to_string();

        let version = parts[2].to_string();
        if !version.starts_with("HTTP/") {
            return Err(ParseError::InvalidRequestLine);
        }

        Ok(Request {
            method,
            path,
            version,
        })
    }

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la versión HTTP declarada por el cliente
    pub fn version(&self) -> &str {
        &self.version
    }
}
