//! # HTTPS Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada: parsea la CLI, carga la configuración, inicializa el
//! logging y arranca el servidor. Cualquier error de arranque termina el
//! proceso con estado distinto de cero.

use std::path::Path;
use std::process;

use clap::Parser;

use https_server::config::{Cli, Config};
use https_server::error::{ServerError, ServerResult};
use https_server::logging;
use https_server::server::Server;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        // El subscriber puede no estar inicializado todavía
        eprintln!("fatal: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> ServerResult<()> {
    let mut config = Config::from_file(Path::new(&cli.config))?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate().map_err(ServerError::Config)?;

    logging::init(config.log_max_size)?;

    tracing::info!(
        port = config.port,
        workers = config.worker_count(),
        rate_limit = config.rate_limit_max_requests,
        window_secs = config.rate_limit_window,
        routing_config = %config.routing_config,
        "configuration loaded"
    );

    let server = Server::new(config)?;
    server.run()
}
