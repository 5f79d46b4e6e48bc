//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Runtime del servidor: es dueño del listener, del contexto TLS, de la tabla
//! de rutas, del rate limiter y del pool de workers.
//!
//! Por cada iteración del loop de accept:
//!
//! ```text
//! accept → RateCheck → {Admitted → TLSHandshake → {Ok → Job encolado,
//!                                                  Err → cierre},
//!                       Denied → cierre inmediato}
//! ```
//!
//! El handshake se hace de forma síncrona en el hilo aceptador: un handshake
//! lento retrasa los accepts siguientes. Los fallos de arranque (bind, TLS,
//! tabla de rutas) son fatales; todo fallo por conexión se loguea y el loop
//! continúa.

use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::ServerResult;
use crate::metrics::ServerStats;
use crate::router::RouteTable;
use crate::security::{spawn_housekeeping, Admission, RateLimiter};
use crate::server::handler::{self, ServerContext};
use crate::server::tls::{TlsConfig, TlsStream};
use crate::workers::{Job, ShutdownMode, WorkerPool};

/// Servidor HTTPS/1.0 concurrente
pub struct Server {
    config: Config,
    ctx: Arc<ServerContext>,
    limiter: Arc<RateLimiter>,
    tls: Arc<rustls::ServerConfig>,
    pool: WorkerPool,
}

impl Server {
    /// Construye el runtime completo: tabla de rutas, contexto TLS, limiter,
    /// contadores y pool. Cualquier fallo aquí aborta el arranque.
    pub fn new(config: Config) -> ServerResult<Self> {
        let routes = Arc::new(RouteTable::from_file(Path::new(&config.routing_config))?);
        tracing::info!(routes = routes.len(), "route table built");

        let tls = TlsConfig::new(&config.tls_cert, &config.tls_key).build_server_config()?;

        let worker_count = config.worker_count();
        let stats = Arc::new(ServerStats::new(worker_count));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window,
        ));
        let pool = WorkerPool::start(worker_count);

        Ok(Self {
            config,
            ctx: Arc::new(ServerContext { routes, stats }),
            limiter,
            tls,
            pool,
        })
    }

    /// Loop principal: acepta conexiones hasta que el proceso termine.
    pub fn run(&self) -> ServerResult<()> {
        let listener = self.bind()?;

        spawn_housekeeping(Arc::clone(&self.limiter), self.config.cull_threshold);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.accept_one(stream),
                // Un accept fallido nunca es fatal
                Err(e) => tracing::warn!("accept failed: {}", e),
            }
        }

        Ok(())
    }

    fn bind(&self) -> ServerResult<TcpListener> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)?;

        tracing::info!(
            address = %address,
            backlog = self.config.backlog,
            workers = self.pool.worker_count(),
            "server listening"
        );

        Ok(listener)
    }

    /// Procesa una conexión aceptada: admisión, handshake, encolado.
    fn accept_one(&self, stream: TcpStream) {
        self.ctx.stats.record_connection();

        let peer = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(e) => {
                tracing::warn!("peer address unavailable: {}", e);
                return;
            }
        };

        // Admisión antes de cualquier trabajo costoso: un cliente rechazado
        // no paga (ni cobra) el handshake
        if self.limiter.admit(peer.ip()) == Admission::Denied {
            self.ctx.stats.record_rate_limited();
            tracing::warn!(client = %peer, "rate limit exceeded, dropping connection");
            return;
        }

        if let Err(e) = self.apply_io_deadlines(&stream) {
            tracing::warn!(client = %peer, "failed to set socket deadlines: {}", e);
            return;
        }

        // Handshake síncrono en el hilo aceptador
        let mut tls_stream = match TlsStream::new(stream, Arc::clone(&self.tls)) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(client = %peer, "TLS session setup failed: {}", e);
                return;
            }
        };

        if let Err(e) = tls_stream.handshake() {
            tracing::warn!(client = %peer, "TLS handshake failed: {}", e);
            return;
        }

        let ctx = Arc::clone(&self.ctx);
        self.pool.submit(Job::new(move || {
            let mut stream = tls_stream;
            handler::handle_connection(&mut stream, peer.ip(), &ctx);

            if let Err(e) = stream.shutdown() {
                tracing::debug!(client = %peer, "TLS shutdown failed: {}", e);
            }
            // El drop del stream cierra el socket
        }));
    }

    /// Plazo de lectura y escritura sobre el socket, previo al handshake.
    fn apply_io_deadlines(&self, stream: &TcpStream) -> std::io::Result<()> {
        let timeout = Some(Duration::from_secs(self.config.io_timeout));
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)
    }

    /// Contadores vivos del servidor
    pub fn stats(&self) -> &ServerStats {
        &self.ctx.stats
    }

    /// Apaga el pool de workers con el modo indicado.
    pub fn shutdown(self, mode: ShutdownMode) {
        tracing::info!(
            connections = self.ctx.stats.total_connections(),
            "shutting down"
        );
        self.pool.shutdown(mode);
    }
}
