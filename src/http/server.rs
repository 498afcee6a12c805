//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared application state from configuration
//! - Create the Axum Router with all handlers
//! - Wire up the filter chain in its fixed order
//! - Serve plain HTTP or TLS until the shutdown signal
//!
//! # Filter Order (outermost first)
//! ```text
//! request id → trace → request id propagation → metrics
//!     → security headers → host validation → timeout
//!     → session → CSRF → current-user resolver → policy gates → handler
//! ```
//! Security headers sit outside host validation so rejections carry them too.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header::InvalidHeaderValue, Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::auth::resolver::{resolve_current_user, UserResolver};
use crate::auth::users::{MemoryUserDirectory, UserDirectory};
use crate::config::PortalConfig;
use crate::http::error::AppError;
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::observability::metrics;
use crate::platform::setup_platform_router;
use crate::records::{PunchLedger, RoleCodeRegistry, TenantRegistry};
use crate::routing::policy::{gate_middleware, PolicyTable};
use crate::security::{
    csrf_middleware, host_validation_middleware, AllowedHosts, CsrfGuard, SecurityHeaders,
};
use crate::session::{session_middleware, CookieSettings, MemorySessionStore, SessionManager};
use crate::web::setup_portal_router;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid content security policy: {0}")]
    InvalidCsp(#[from] InvalidHeaderValue),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub users: Arc<dyn UserDirectory>,
    pub resolver: UserResolver,
    pub tenants: TenantRegistry,
    pub role_codes: RoleCodeRegistry,
    pub punches: PunchLedger,
}

impl AppState {
    /// In-memory stores seeded from configuration.
    pub fn from_config(config: &PortalConfig) -> Self {
        let store = MemorySessionStore::new();
        let users: Arc<dyn UserDirectory> =
            Arc::new(MemoryUserDirectory::from_seeds(config.users.clone()));
        let tenants = TenantRegistry::from_seeds(config.tenants.clone());
        Self::new(config, store, users, tenants)
    }

    /// State over caller-provided stores.
    pub fn new(
        config: &PortalConfig,
        store: MemorySessionStore,
        users: Arc<dyn UserDirectory>,
        tenants: TenantRegistry,
    ) -> Self {
        let cookie = CookieSettings::from_config(&config.session, config.app_env);
        Self {
            sessions: SessionManager::new(store, cookie),
            resolver: UserResolver::new(users.clone(), tenants.clone()),
            users,
            tenants,
            role_codes: RoleCodeRegistry::new(),
            punches: PunchLedger::new(),
        }
    }
}

/// HTTP server for the portal.
pub struct HttpServer {
    router: Router,
    config: PortalConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: PortalConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    pub fn with_state(config: PortalConfig, state: AppState) -> Result<Self, ServerError> {
        let router = Self::build_router(&config, state.clone())?;
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `Router::layer` wraps what came before, so layers are listed innermost first.
    fn build_router(config: &PortalConfig, state: AppState) -> Result<Router, ServerError> {
        let headers = SecurityHeaders::new(&config.security.content_security_policy)?;
        let hosts = AllowedHosts::new(&config.security.allowed_hosts);
        let csrf = CsrfGuard {
            max_body_size: config.security.max_body_size,
        };
        let policies = Arc::new(PolicyTable::standard());

        let router = Router::new()
            .merge(setup_portal_router())
            .merge(setup_admin_router())
            .merge(setup_platform_router())
            .fallback(not_found)
            .layer(from_fn_with_state(policies, gate_middleware))
            .layer(from_fn_with_state(state.resolver.clone(), resolve_current_user))
            .layer(from_fn_with_state(csrf, csrf_middleware))
            .layer(from_fn(session_middleware))
            .layer(state.sessions.layer())
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(request_timeout(Duration::from_secs(config.timeouts.request_secs)))
            .layer(from_fn_with_state(hosts, host_validation_middleware))
            .with_state(state);

        Ok(headers
            .apply(router)
            .layer(from_fn(metrics::track_requests))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(set_request_id_layer()))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let handle = Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);

        let signal_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTPS server draining connections");
            signal_handle.graceful_shutdown(Some(grace));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Requests still running after `limit` are answered with 408.
fn request_timeout(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
