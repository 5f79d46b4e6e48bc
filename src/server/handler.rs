//! # Atención de Requests
//! src/server/handler.rs
//!
//! Lógica que ejecuta un worker para una conexión ya establecida: leer el
//! request, parsear método y path, resolver contra la tabla de rutas y
//! escribir exactamente una respuesta antes del cierre.
//!
//! El handler es genérico sobre el stream: en producción recibe la sesión TLS
//! y en tests un socket plano, el código es el mismo.

use std::io::{Read, Write};
use std::net::IpAddr;
use std::sync::Arc;

use crate::http::{Method, ParseError, Request, Response, StatusCode};
use crate::metrics::ServerStats;
use crate::router::{RouteTable, FALLBACK_BODY};

/// Tamaño del buffer de lectura por iteración
const RECV_BUF_SIZE: usize = 4096;

/// Límite duro del request acumulado
const MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Contexto inmutable compartido por todos los workers
pub struct ServerContext {
    pub routes: Arc<RouteTable>,
    pub stats: Arc<ServerStats>,
}

/// Atiende una conexión completa: una respuesta y cierre.
pub fn handle_connection<S: Read + Write>(stream: &mut S, peer: IpAddr, ctx: &ServerContext) {
    ctx.stats.record_request();

    let request_bytes = read_request(stream);

    // Cero bytes acumulados: request vacío, se cierra sin responder
    if request_bytes.is_empty() {
        tracing::warn!(client = %peer, "empty request, closing without response");
        return;
    }

    let response = match Request::parse(&request_bytes) {
        Ok(request) => {
            ctx.stats.record_valid();
            tracing::info!(
                client = %peer,
                method = request.method().as_str(),
                path = request.path(),
                "incoming request"
            );
            dispatch(&request, ctx)
        }
        Err(ParseError::UnsupportedMethod(method)) => {
            tracing::warn!(client = %peer, method = %method, "unsupported method");
            method_not_allowed()
        }
        Err(e) => {
            tracing::warn!(client = %peer, "malformed request: {}", e);
            Response::error(StatusCode::BadRequest, &e.to_string())
        }
    };

    if response.status().is_success() {
        ctx.stats.record_success();
    }

    if let Err(e) = stream
        .write_all(&response.to_bytes())
        .and_then(|()| stream.flush())
    {
        // Sin reintentos: el cliente puede haber cortado
        tracing::warn!(client = %peer, "response write failed: {}", e);
    }
}

/// Lee del stream hasta observar un fin de línea, llenar el límite o que la
/// lectura no entregue más bytes. Un error de lectura termina la acumulación.
fn read_request<S: Read>(stream: &mut S) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; RECV_BUF_SIZE];

    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                request.extend_from_slice(&buf[..n]);
                if buf[n - 1] == b'\n' || request.len() >= MAX_REQUEST_SIZE {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("request read interrupted: {}", e);
                break;
            }
        }
    }

    request
}

/// Despacha por método y path.
fn dispatch(request: &Request, ctx: &ServerContext) -> Response {
    match request.method() {
        Method::GET if request.path() == "/status" => Response::json(&ctx.stats.status_json()),
        Method::GET => serve_route(request.path(), &ctx.routes),
        _ => method_not_allowed(),
    }
}

/// Resuelve un GET contra la tabla: 200 en hit, 404 con fallback en miss.
fn serve_route(path: &str, routes: &RouteTable) -> Response {
    if let Some(route) = routes.lookup(path) {
        return Response::new(StatusCode::Ok)
            .with_header("Content-Type", &route.mime_type)
            .with_body_bytes(route.content.clone());
    }

    match routes.fallback() {
        Some(route) => Response::new(StatusCode::NotFound)
            .with_header("Content-Type", &route.mime_type)
            .with_body_bytes(route.content.clone()),
        None => Response::new(StatusCode::NotFound)
            .with_header("Content-Type", "text/plain")
            .with_body(FALLBACK_BODY),
    }
}

fn method_not_allowed() -> Response {
    Response::error(StatusCode::MethodNotAllowed, "only GET is supported")
        .with_header("Allow", "GET")
}
