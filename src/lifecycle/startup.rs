//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (metrics exporter, session sweeper)
//! - Bind the listener and serve until a signal arrives
//! - Drain within the configured grace period
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)
//! - A server that outlives the grace period is aborted

use std::net::AddrParseError;
use std::time::Duration;

use metrics_exporter_prometheus::BuildError;
use tokio::task::{JoinError, JoinHandle};

use crate::config::PortalConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::net::{bind, load_tls_config, parse_bind_address, ListenerError};
use crate::observability::metrics;
use crate::session::SessionSweeper;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),
    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("failed to load TLS configuration: {0}")]
    Tls(#[from] std::io::Error),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Run the portal until a shutdown signal, then drain.
pub async fn run(config: PortalConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config.clone())?;

    let sweeper = SessionSweeper::new(
        server.state().sessions.store().clone(),
        Duration::from_secs(config.session.sweep_interval_secs),
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.subscribe()));

    let server_rx = shutdown.subscribe();
    let mut server_task: JoinHandle<Result<(), ServerError>> = match &config.listener.tls {
        Some(tls) => {
            let tls = load_tls_config(tls).await?;
            let address = parse_bind_address(&config.listener)?;
            tokio::spawn(server.run_tls(address, tls, server_rx))
        }
        None => {
            let listener = bind(&config.listener).await?;
            tokio::spawn(server.run(listener, server_rx))
        }
    };

    tokio::select! {
        signal = wait_for_signal() => {
            tracing::info!(signal, "Shutdown signal received");
        }
        joined = &mut server_task => {
            // The server stopped on its own; stop the sweeper too.
            shutdown.trigger();
            let _ = sweeper_task.await;
            return Ok(joined??);
        }
    }

    shutdown.trigger();

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    match tokio::time::timeout(grace, &mut server_task).await {
        Ok(joined) => joined??,
        Err(_) => {
            tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, aborting server");
            server_task.abort();
        }
    }

    let _ = sweeper_task.await;
    Ok(())
}
