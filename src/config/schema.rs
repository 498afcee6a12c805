//! Typed portal configuration.
//!
//! Every section falls back to its `Default`, so an empty file is a valid
//! development config.

use serde::{Deserialize, Serialize};

use crate::auth::identity::{Role, TenantId, UserId};

/// Root configuration for the attendance portal.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PortalConfig {
    /// Deployment environment; drives secure-cookie defaults.
    pub app_env: AppEnv,

    /// Where the portal accepts connections.
    pub listener: ListenerConfig,

    /// Session cookie and lifetime settings.
    pub session: SessionConfig,

    /// Host allow-list, CSP and body limits.
    pub security: SecurityConfig,

    /// Request and shutdown deadlines.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Seed tenants loaded into the tenant registry at startup.
    pub tenants: Vec<TenantSeed>,

    /// Seed accounts loaded into the user directory at startup.
    pub users: Vec<UserSeed>,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

/// Socket the HTTP server binds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// `host:port`, e.g. "127.0.0.1:8080".
    pub bind_address: String,

    /// Serve HTTPS when present.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            tls: None,
        }
    }
}

/// PEM certificate and key for HTTPS.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Certificate chain path.
    pub cert_path: String,

    /// Private key path.
    pub key_path: String,
}

/// Session settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Idle timeout in seconds; each request on the session restarts it.
    pub lifetime_secs: u64,

    /// Explicit `Secure` flag override. `None` means "secure in production".
    pub secure_cookie: Option<bool>,

    /// How often expired sessions are swept from the store.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "portal_session".to_string(),
            lifetime_secs: 8 * 60 * 60,
            secure_cookie: None,
            sweep_interval_secs: 300,
        }
    }
}

impl SessionConfig {
    /// Resolve the `Secure` cookie flag for the given environment.
    pub fn secure_for(&self, env: AppEnv) -> bool {
        self.secure_cookie.unwrap_or(env == AppEnv::Production)
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Accepted `Host` header values. Empty disables host validation.
    pub allowed_hosts: Vec<String>,

    /// Value of the `content-security-policy` response header.
    pub content_security_policy: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            content_security_policy: "default-src 'self'; frame-ancestors 'none'; form-action 'self'; base-uri 'self'".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound on one request, in seconds.
    pub request_secs: u64,

    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output and the Prometheus exporter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter level; `RUST_LOG` wins when set.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Start the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A tenant created at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantSeed {
    pub id: TenantId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// An account created at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserSeed {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,

    /// Owning tenant. Platform admins may have none.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,

    /// Argon2 PHC string, e.g. produced by `portal-cli hash-password`.
    pub password_hash: String,

    /// Base64url TOTP secret. When set, sign-in asks for a code after the password.
    #[serde(default)]
    pub totp_secret: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
