//! # Rate Limiting por Cliente
//! src/security/rate_limit.rs
//!
//! Limitador de ventana fija por dirección de cliente, pensado para llamarse
//! una vez por conexión entrante desde el hilo aceptador.
//!
//! La tabla dirección → ventana es un [`DashMap`]: la inserción de claves
//! nuevas queda sincronizada por los shards del mapa, y los dos campos de cada
//! ventana son atómicos independientes, así que el camino caliente (cliente ya
//! conocido) no toma ningún lock exclusivo.
//!
//! ## Rollover de la ventana
//!
//! Cuando la ventana de un cliente expira, el primer hilo que logra el
//! compare-and-swap sobre `window_start` reinicia el contador a 1. Un hilo que
//! pierde el CAS cae al incremento normal: en el peor caso una ráfaga en el
//! borde de la ventana se subcuenta en uno, pero ninguna decisión de admisión
//! se pierde.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Resultado de la decisión de admisión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

/// Estado por cliente: contador de la ventana actual y su segundo de inicio,
/// relativo al arranque del limitador.
struct ClientWindow {
    count: AtomicU64,
    window_start: AtomicU64,
}

/// Limitador de ventana fija compartido por todas las conexiones
pub struct RateLimiter {
    clients: DashMap<IpAddr, ClientWindow>,
    max_requests: u64,
    window_secs: u64,
    epoch: Instant,
}

impl RateLimiter {
    /// Crea un limitador con `max_requests` por ventana de `window_secs`.
    pub fn new(max_requests: u64, window_secs: u64) -> Self {
        Self {
            clients: DashMap::new(),
            max_requests,
            window_secs,
            epoch: Instant::now(),
        }
    }

    fn now_secs(&self) -> u64 {
        self.epoch.elapsed().as_secs()
    }

    /// Decide la admisión de una conexión entrante.
    ///
    /// Llamar exactamente una vez por conexión, antes del handshake TLS.
    pub fn admit(&self, addr: IpAddr) -> Admission {
        self.admit_at(addr, self.now_secs())
    }

    /// Variante con reloj inyectado, para decisiones deterministas en tests.
    fn admit_at(&self, addr: IpAddr, now: u64) -> Admission {
        let window = self.clients.entry(addr).or_insert_with(|| ClientWindow {
            count: AtomicU64::new(0),
            window_start: AtomicU64::new(now),
        });

        let started = window.window_start.load(Ordering::Acquire);
        if now.saturating_sub(started) > self.window_secs {
            // Rollover: solo un hilo gana el CAS y reinicia el contador
            if window
                .window_start
                .compare_exchange(started, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                window.count.store(1, Ordering::Release);
                return Admission::Allowed;
            }
        }

        if window.count.fetch_add(1, Ordering::AcqRel) + 1 > self.max_requests {
            Admission::Denied
        } else {
            Admission::Allowed
        }
    }

    /// Elimina las ventanas sin actividad hace más de `threshold_secs`.
    pub fn cull(&self, threshold_secs: u64) {
        self.cull_at(self.now_secs(), threshold_secs);
    }

    fn cull_at(&self, now: u64, threshold_secs: u64) {
        self.clients.retain(|_, window| {
            now.saturating_sub(window.window_start.load(Ordering::Acquire)) <= threshold_secs
        });
    }

    /// Cantidad de clientes con ventana registrada
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Lanza el hilo de housekeeping que aplica [`RateLimiter::cull`]
/// periódicamente con el umbral configurado.
pub fn spawn_housekeeping(
    limiter: Arc<RateLimiter>,
    threshold_secs: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(threshold_secs.max(1)));
        limiter.cull(threshold_secs);
        tracing::debug!(
            tracked = limiter.tracked_clients(),
            "rate limit table culled"
        );
    })
}
