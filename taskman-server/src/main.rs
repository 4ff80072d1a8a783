//! `taskman-server`: task CRUD over HTTP, held in memory.
//!
//! ```bash
//! taskman-server                                  # 0.0.0.0:3000, any origin
//! PORT=8080 taskman-server --host 127.0.0.1
//! taskman-server --allow-origin http://localhost:5173
//! ```
//!
//! Runs until Ctrl-C. Tasks are lost on exit.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use taskman_server::api::{self, ServerState};
use taskman_server::config::{CorsOrigins, ServerCliArgs, ServerConfig};
use taskman_server::store::TaskStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = ServerCliArgs::parse();
    let config = match ServerConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("taskman-server: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let listener = match tokio::net::TcpListener::bind(config.listen_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr(), error = %e, "cannot bind");
            return ExitCode::FAILURE;
        }
    };

    let cors = match &config.cors {
        CorsOrigins::Any => "*".to_string(),
        CorsOrigins::List(origins) => format!("{} origin(s)", origins.len()),
    };
    let state = Arc::new(ServerState::from_config(&config, TaskStore::new()));
    let app = api::router(state);

    match listener.local_addr() {
        Ok(addr) => tracing::info!(
            %addr,
            cors = %cors,
            max_body_size = config.max_body_size,
            "taskman api listening"
        ),
        Err(e) => tracing::warn!(error = %e, "listening on unknown address"),
    }

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await;

    if let Err(e) = served {
        tracing::error!(error = %e, "server stopped with an error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
