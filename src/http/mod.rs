//! # Módulo HTTP
//!
//! Implementa la parte del protocolo HTTP/1.0 que el servidor necesita, sin
//! librerías de alto nivel:
//!
//! - Parsing de la request line (método + path)
//! - Construcción de responses HTTP
//! - Manejo de status codes
//!
//! El servidor no es una implementación HTTP/1.1 general: no hay chunked
//! transfer, ni keep-alive, ni continuación de headers. Cada conexión recibe
//! exactamente una respuesta y se cierra.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <html>...</html>
//! ```

pub mod request; // Parsing de la request line
pub mod response; // Construcción de HTTP responses
pub mod status; // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, Request, MAX_REQUEST_LINE};
pub use response::Response;
pub use status::StatusCode;
