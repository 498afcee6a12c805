//! Multi-tenant attendance portal.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (listener / TLS)
//!                      │
//!                      ▼
//!                     http (request id, trace, metrics)
//!                      │
//!                      ▼
//!                     security (headers, host filter)
//!                      │
//!                      ▼
//!                     session (load / commit) ──▶ security (CSRF)
//!                      │
//!                      ▼
//!                     auth (current-user resolver)
//!                      │
//!                      ▼
//!                     routing (policy table → gates)
//!                      │
//!                      ▼
//!                     web / admin / platform handlers ──▶ records
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;

use attendance_portal::config::{load_config, PortalConfig};
use attendance_portal::lifecycle;
use attendance_portal::observability::logging;

#[derive(Parser)]
#[command(name = "attendance-portal")]
#[command(about = "Multi-tenant attendance and account portal", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when it is absent.
    #[arg(short, long, default_value = "portal.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (config, loaded) = if args.config.exists() {
        (load_config(&args.config)?, true)
    } else {
        (PortalConfig::default(), false)
    };

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "attendance-portal starting");
    if !loaded {
        tracing::warn!(path = %args.config.display(), "Config file not found, using defaults");
    }
    tracing::info!(
        bind_address = %config.listener.bind_address,
        app_env = ?config.app_env,
        tls = config.listener.tls.is_some(),
        allowed_hosts = config.security.allowed_hosts.len(),
        users = config.users.len(),
        tenants = config.tenants.len(),
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
