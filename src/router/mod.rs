//! # Tabla de Rutas
//! src/router/mod.rs
//!
//! Mapea paths de request a contenido precargado. La tabla se construye una
//! sola vez en el arranque leyendo el archivo de rutas y cargando cada archivo
//! referenciado completo en memoria; después de eso es inmutable y se comparte
//! entre todos los workers sin sincronización.
//!
//! ## Formato del archivo de rutas
//!
//! ```text
//! # comentario
//! /index   ./public/index.html   text/html
//! /404     ./public/404.html     text/html
//! ```
//!
//! Una línea malformada o un archivo ilegible descarta esa ruta con un
//! diagnóstico; nunca aborta la construcción completa.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ServerError, ServerResult};

/// Path reservado para la ruta de fallback de 404
pub const FALLBACK_ROUTE: &str = "/404";

/// Cuerpo literal cuando ni siquiera hay ruta de fallback registrada
pub const FALLBACK_BODY: &str = "404 - Page Not Found";

/// Una ruta servible: path de request, MIME type y contenido precargado
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Tabla inmutable path → [`Route`]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    /// Construye la tabla desde el archivo de rutas.
    ///
    /// No poder abrir el archivo de rutas sí es fatal: sin él el servidor no
    /// tiene nada que servir.
    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ServerError::Routing(format!(
                "failed to open routing config {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::from_lines(&text))
    }

    /// Construye la tabla desde el contenido del archivo de rutas.
    pub fn from_lines(text: &str) -> Self {
        let mut routes = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();

            // Líneas vacías y comentarios
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            // Cada ruta: "request_path file_path MIME_type"
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() != 3 {
                tracing::warn!(
                    line = line_no + 1,
                    "invalid routing config line, skipping: {}",
                    trimmed
                );
                continue;
            }

            let (route_path, file_path, mime_type) = (parts[0], parts[1], parts[2]);

            match fs::read(file_path) {
                Ok(content) => {
                    tracing::info!(route = route_path, file = file_path, "route attached");
                    routes.insert(
                        route_path.to_string(),
                        Route {
                            path: route_path.to_string(),
                            mime_type: mime_type.to_string(),
                            content,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        route = route_path,
                        file = file_path,
                        "cannot open route file, skipping route: {}",
                        e
                    );
                }
            }
        }

        Self { routes }
    }

    /// Busca una ruta registrada. Lectura pura, sin locks.
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    /// Ruta de fallback para responder 404, si fue registrada
    pub fn fallback(&self) -> Option<&Route> {
        self.routes.get(FALLBACK_ROUTE)
    }

    /// Cantidad de rutas registradas
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Verifica si la tabla está vacía
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
