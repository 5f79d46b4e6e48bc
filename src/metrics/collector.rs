//! # Contadores del Servidor
//! src/metrics/collector.rs
//!
//! Contadores vivos del servidor. Cada contador es un atómico independiente:
//! los workers y el aceptador los actualizan sin locks y sin ningún orden
//! requerido entre ellos.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Contadores compartidos del servidor
pub struct ServerStats {
    start_time: Instant,
    thread_count: usize,
    total_connections: AtomicU64,
    total_requests: AtomicU64,
    valid_requests: AtomicU64,
    successful_requests: AtomicU64,
    rate_limited_requests: AtomicU64,
}

/// Cuerpo del endpoint `GET /status`
#[derive(Serialize)]
struct StatusDocument<'a> {
    uptime: String,
    platform: &'a str,
    os_version: String,
    server_version: &'a str,
    thread_count: usize,
    total_requests: u64,
    valid_requests: u64,
    successful_requests: u64,
    rate_limited_requests: u64,
}

impl ServerStats {
    /// Crea los contadores en cero; `thread_count` es el tamaño del pool.
    pub fn new(thread_count: usize) -> Self {
        Self {
            start_time: Instant::now(),
            thread_count,
            total_connections: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            valid_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            rate_limited_requests: AtomicU64::new(0),
        }
    }

    /// Conexión aceptada por el listener
    pub fn record_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Job de conexión ejecutado por un worker
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Request line parseada correctamente
    pub fn record_valid(&self) {
        self.valid_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Respuesta 200 enviada
    pub fn record_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Conexión descartada por rate limiting, antes del handshake
    pub fn record_rate_limited(&self) {
        self.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn valid_requests(&self) -> u64 {
        self.valid_requests.load(Ordering::Relaxed)
    }

    pub fn successful_requests(&self) -> u64 {
        self.successful_requests.load(Ordering::Relaxed)
    }

    pub fn rate_limited_requests(&self) -> u64 {
        self.rate_limited_requests.load(Ordering::Relaxed)
    }

    /// Segundos desde el arranque
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Genera el cuerpo JSON del endpoint `/status`.
    pub fn status_json(&self) -> String {
        let document = StatusDocument {
            uptime: format_uptime(self.uptime_secs()),
            platform: std::env::consts::OS,
            os_version: os_version(),
            server_version: env!("CARGO_PKG_VERSION"),
            thread_count: self.thread_count,
            total_requests: self.total_requests(),
            valid_requests: self.valid_requests(),
            successful_requests: self.successful_requests(),
            rate_limited_requests: self.rate_limited_requests(),
        };

        serde_json::to_string_pretty(&document).expect("status document serializes")
    }
}

/// Formatea un uptime en segundos como `"2d 3h 15m 30s"`.
///
/// Las unidades mayores se omiten mientras sean cero: `61` → `"1m 1s"`.
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));

    parts.join(" ")
}

/// Versión del kernel, o "unknown" fuera de Linux
fn os_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| String::from("unknown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = ServerStats::new(4);

        assert_eq!(stats.total_connections(), 0);
        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.valid_requests(), 0);
        assert_eq!(stats.successful_requests(), 0);
        assert_eq!(stats.rate_limited_requests(), 0);
    }

    #[test]
    fn test_counters_accumulate() {
        let stats = ServerStats::new(4);

        stats.record_connection();
        stats.record_request();
        stats.record_request();
        stats.record_valid();
        stats.record_success();
        stats.record_rate_limited();

        assert_eq!(stats.total_connections(), 1);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.valid_requests(), 1);
        assert_eq!(stats.successful_requests(), 1);
        assert_eq!(stats.rate_limited_requests(), 1);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ServerStats::new(4));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_request();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.total_requests(), 8000);
    }

    #[test]
    fn test_status_json_fields() {
        let stats = ServerStats::new(4);
        stats.record_request();
        stats.record_valid();
        stats.record_success();

        let json = stats.status_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(parsed["uptime"].is_string());
        assert!(parsed["platform"].is_string());
        assert!(parsed["os_version"].is_string());
        assert_eq!(parsed["server_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(parsed["thread_count"], 4);
        assert_eq!(parsed["total_requests"], 1);
        assert_eq!(parsed["valid_requests"], 1);
        assert_eq!(parsed["successful_requests"], 1);
        assert_eq!(parsed["rate_limited_requests"], 0);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(61), "1m 1s");
        assert_eq!(format_uptime(3_600), "1h 0m 0s");
        assert_eq!(format_uptime(90_061), "1d 1h 1m 1s");
        // 2 días, 3 horas, 15 minutos, 30 segundos
        assert_eq!(format_uptime(2 * 86_400 + 3 * 3_600 + 15 * 60 + 30), "2d 3h 15m 30s");
    }
}
