//! # Pool de Workers
//! src/workers/mod.rs
//!
//! Pool fijo de threads que consume una cola FIFO compartida. Los workers se
//! crean completos en el arranque y bloquean en una condvar hasta que haya un
//! job o se señale el apagado.
//!
//! La cola no tiene límite: bajo sobrecarga sostenida crece en memoria en vez
//! de rechazar trabajo. El rate limiter descarta carga antes de llegar aquí.
//!
//! ## Apagado
//!
//! El apagado es un modo explícito, no un efecto del orden de despertar:
//! [`ShutdownMode::Drain`] procesa los jobs encolados hasta vaciar la cola o
//! agotar el plazo (y entonces escala a cancelación), mientras que
//! [`ShutdownMode::CancelNow`] abandona la cola de inmediato. En ambos modos
//! un job ya en ejecución termina completo.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Una unidad de trabajo: se encola una vez y la ejecuta exactamente un worker.
pub struct Job(Box<dyn FnOnce() + Send + 'static>);

impl Job {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    fn run(self) {
        (self.0)()
    }
}

/// Modo de apagado del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Procesa los jobs encolados hasta vaciar la cola o agotar el plazo
    Drain(Duration),

    /// Abandona los jobs encolados; los que ya corren terminan
    CancelNow,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Draining,
    Terminated,
}

struct PoolState {
    jobs: VecDeque<Job>,
    phase: Phase,
}

struct PoolShared {
    state: Mutex<PoolState>,
    /// Productor → workers: hay un job nuevo o cambió la fase
    available: Condvar,
    /// Workers → apagado: la cola quedó vacía
    drained: Condvar,
}

/// Pool fijo de workers sobre una cola FIFO compartida
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Arranca `worker_count` workers de inmediato.
    pub fn start(worker_count: usize) -> Self {
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                phase: Phase::Running,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
        });

        tracing::info!(workers = worker_count, "starting worker pool");

        let workers = (0..worker_count)
            .map(|id| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || Self::worker_loop(id, shared))
            })
            .collect();

        Self { shared, workers }
    }

    /// Cantidad de workers del pool
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Encola un job al final de la cola y despierta exactamente un worker.
    pub fn submit(&self, job: Job) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.jobs.push_back(job);
        }
        self.shared.available.notify_one();
    }

    /// Jobs encolados que aún no tomó ningún worker
    pub fn queued(&self) -> usize {
        self.shared.state.lock().unwrap().jobs.len()
    }

    /// Apaga el pool según el modo indicado y espera a los workers.
    ///
    /// Con `Drain`, si el plazo vence con jobs pendientes estos se descartan
    /// y el apagado continúa como cancelación.
    pub fn shutdown(mut self, mode: ShutdownMode) {
        match mode {
            ShutdownMode::CancelNow => {
                let mut state = self.shared.state.lock().unwrap();
                state.phase = Phase::Terminated;
                let dropped = state.jobs.len();
                state.jobs.clear();
                drop(state);

                if dropped > 0 {
                    tracing::warn!(dropped, "worker pool cancelled with queued jobs");
                }
            }
            ShutdownMode::Drain(timeout) => {
                let deadline = Instant::now() + timeout;
                let mut state = self.shared.state.lock().unwrap();
                state.phase = Phase::Draining;
                self.shared.available.notify_all();

                while !state.jobs.is_empty() {
                    let now = Instant::now();
                    if now >= deadline {
                        let dropped = state.jobs.len();
                        state.jobs.clear();
                        tracing::warn!(dropped, "drain deadline expired, dropping queued jobs");
                        break;
                    }
                    let (next, _) = self
                        .shared
                        .drained
                        .wait_timeout(state, deadline - now)
                        .unwrap();
                    state = next;
                }

                state.phase = Phase::Terminated;
                drop(state);
            }
        }

        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        tracing::info!("worker pool stopped");
    }

    /// Loop principal de cada worker: espera un job y lo ejecuta.
    fn worker_loop(id: usize, shared: Arc<PoolShared>) {
        tracing::debug!(worker = id, "worker started");

        loop {
            let job = {
                let mut state = shared.state.lock().unwrap();
                loop {
                    if state.phase == Phase::Terminated {
                        return;
                    }
                    if let Some(job) = state.jobs.pop_front() {
                        if state.jobs.is_empty() {
                            shared.drained.notify_all();
                        }
                        break job;
                    }
                    match state.phase {
                        Phase::Running => state = shared.available.wait(state).unwrap(),
                        // Draining con cola vacía: no queda nada que procesar
                        _ => return,
                    }
                }
            };

            // El job corre fuera del lock: un job lento no bloquea la cola
            job.run();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.phase = Phase::Terminated;
        }
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
