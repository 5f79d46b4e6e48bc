//! Tests de integración del pipeline del servidor
//! tests/integration_test.rs
//!
//! Levantan el pipeline completo (rate limiter → pool de workers → handler →
//! tabla de rutas) sobre un listener TCP efímero, sin TLS: el handler es
//! genérico sobre el stream, así que el transporte plano ejercita el mismo
//! código que recorre la sesión cifrada.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use https_server::metrics::ServerStats;
use https_server::router::RouteTable;
use https_server::security::{Admission, RateLimiter};
use https_server::server::handler::{handle_connection, ServerContext};
use https_server::workers::{Job, WorkerPool};

/// Escribe un archivo de contenido temporal y retorna su ruta.
fn temp_content_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "https_server_it_{}_{}",
        std::process::id(),
        name
    ));
    fs::write(&path, content).expect("write temp content file");
    path
}

/// Pipeline de prueba: aceptador + admisión + pool + handler.
struct Pipeline {
    addr: SocketAddr,
    stats: Arc<ServerStats>,
}

fn spawn_pipeline(routing_lines: &str, limiter: RateLimiter) -> Pipeline {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap();

    let ctx = Arc::new(ServerContext {
        routes: Arc::new(RouteTable::from_lines(routing_lines)),
        stats: Arc::new(ServerStats::new(4)),
    });
    let stats = Arc::clone(&ctx.stats);
    let limiter = Arc::new(limiter);

    thread::spawn(move || {
        let pool = WorkerPool::start(4);

        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            ctx.stats.record_connection();

            let Ok(peer) = stream.peer_addr() else { continue };
            if limiter.admit(peer.ip()) == Admission::Denied {
                ctx.stats.record_rate_limited();
                continue; // el drop cierra la conexión sin respuesta
            }

            let ctx = Arc::clone(&ctx);
            pool.submit(Job::new(move || {
                let mut stream = stream;
                handle_connection(&mut stream, peer.ip(), &ctx);
            }));
        }
    });

    Pipeline { addr, stats }
}

/// Envía bytes crudos y retorna la respuesta completa como texto.
fn send_raw(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(raw).unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn send_request(addr: SocketAddr, path: &str) -> String {
    send_raw(addr, format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes())
}

/// Extrae el body de una response HTTP.
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

#[test]
fn test_registered_route_served_verbatim() {
    let index = temp_content_file("index.txt", "hello");
    let pipeline = spawn_pipeline(
        &format!("/index {} text/plain\n", index.display()),
        RateLimiter::new(100, 60),
    );

    let response = send_request(pipeline.addr, "/index");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "got: {}", response);
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert_eq!(extract_body(&response), "hello");

    let _ = fs::remove_file(index);
}

#[test]
fn test_missing_route_uses_fallback() {
    let page = temp_content_file("404.txt", "not found");
    let pipeline = spawn_pipeline(
        &format!("/404 {} text/plain\n", page.display()),
        RateLimiter::new(100, 60),
    );

    let response = send_request(pipeline.addr, "/missing");

    assert!(response.starts_with("HTTP/1.0 404 NOT FOUND\r\n"));
    assert_eq!(extract_body(&response), "not found");

    let _ = fs::remove_file(page);
}

#[test]
fn test_missing_route_without_fallback() {
    let pipeline = spawn_pipeline("", RateLimiter::new(100, 60));

    let response = send_request(pipeline.addr, "/missing");

    assert!(response.starts_with("HTTP/1.0 404 NOT FOUND\r\n"));
    assert_eq!(extract_body(&response), "404 - Page Not Found");
}

#[test]
fn test_non_get_method_rejected() {
    let pipeline = spawn_pipeline("", RateLimiter::new(100, 60));

    let response = send_raw(pipeline.addr, b"POST /index HTTP/1.0\r\n\r\n");

    assert!(response.starts_with("HTTP/1.0 405 METHOD NOT ALLOWED\r\n"));
    assert!(response.contains("Allow: GET\r\n"));
}

#[test]
fn test_malformed_request_line_rejected() {
    let pipeline = spawn_pipeline("", RateLimiter::new(100, 60));

    let response = send_raw(pipeline.addr, b"GET /index\r\n\r\n");

    assert!(response.starts_with("HTTP/1.0 400 BAD REQUEST\r\n"));
}

#[test]
fn test_status_endpoint() {
    let pipeline = spawn_pipeline("", RateLimiter::new(100, 60));

    let response = send_request(pipeline.addr, "/status");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(response.contains("Content-Type: application/json\r\n"));

    let parsed: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert!(parsed["uptime"].is_string());
    assert!(parsed["platform"].is_string());
    assert!(parsed["os_version"].is_string());
    assert!(parsed["server_version"].is_string());
    assert_eq!(parsed["thread_count"], 4);
    assert!(parsed["total_requests"].is_u64());
    assert!(parsed["valid_requests"].is_u64());
    assert!(parsed["successful_requests"].is_u64());
    assert!(parsed["rate_limited_requests"].is_u64());
}

#[test]
fn test_rate_limited_client_dropped_without_response() {
    let index = temp_content_file("limited.txt", "ok");
    let pipeline = spawn_pipeline(
        &format!("/index {} text/plain\n", index.display()),
        RateLimiter::new(3, 60),
    );

    // Las tres primeras conexiones dentro de la ventana pasan
    for _ in 0..3 {
        let response = send_request(pipeline.addr, "/index");
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    }

    // La cuarta se corta antes del handler: cero bytes de respuesta
    let response = send_request(pipeline.addr, "/index");
    assert!(response.is_empty(), "got: {}", response);

    // Dar tiempo a que el aceptador registre el contador
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pipeline.stats.rate_limited_requests(), 1);
    assert_eq!(pipeline.stats.total_connections(), 4);
    // La conexión rechazada nunca cuenta como request
    assert_eq!(pipeline.stats.total_requests(), 3);

    let _ = fs::remove_file(index);
}

#[test]
fn test_repeated_gets_are_idempotent() {
    let index = temp_content_file("stable.txt", "immutable");
    let pipeline = spawn_pipeline(
        &format!("/index {} text/plain\n", index.display()),
        RateLimiter::new(100, 60),
    );

    let first = send_request(pipeline.addr, "/index");
    let second = send_request(pipeline.addr, "/index");
    let third = send_request(pipeline.addr, "/index");

    assert_eq!(first, second);
    assert_eq!(second, third);

    let _ = fs::remove_file(index);
}

#[test]
fn test_many_concurrent_requests_all_answered() {
    let index = temp_content_file("concurrent.txt", "payload");
    let pipeline = spawn_pipeline(
        &format!("/index {} text/plain\n", index.display()),
        RateLimiter::new(1_000, 60),
    );

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let addr = pipeline.addr;
            thread::spawn(move || send_request(addr, "/index"))
        })
        .collect();

    for handle in handles {
        let response = handle.join().unwrap();
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
        assert_eq!(extract_body(&response), "payload");
    }

    // Cada conexión fue exactamente un job, ninguna se perdió ni se duplicó
    thread::sleep(Duration::from_millis(100));
    assert_eq!(pipeline.stats.successful_requests(), 50);
    assert_eq!(pipeline.stats.total_requests(), 50);

    let _ = fs::remove_file(index);
}
